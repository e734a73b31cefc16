use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("engportal")
        .env("ENGPORTAL_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    assert!(!config_path.exists());

    cargo_bin_cmd!("engportal")
        .env("ENGPORTAL_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("base_url"));
    assert!(contents.contains("timeout_ms"));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "# existing config").unwrap();

    cargo_bin_cmd!("engportal")
        .env("ENGPORTAL_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_set_base_url_keeps_other_values() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "timeout_ms = 5000\n").unwrap();

    cargo_bin_cmd!("engportal")
        .env("ENGPORTAL_HOME", dir.path())
        .args(["config", "set-base-url", "http://localhost:5000/api/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Base URL set to http://localhost:5000/api"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains(r#"base_url = "http://localhost:5000/api""#));
    assert!(contents.contains("timeout_ms = 5000"));
}

#[test]
fn test_set_base_url_rejects_non_http() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("engportal")
        .env("ENGPORTAL_HOME", dir.path())
        .args(["config", "set-base-url", "ftp://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be http(s)"));
}
