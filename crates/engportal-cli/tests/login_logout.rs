//! Integration tests for login/logout/status.


use std::fs;

use fixtures::{TOKEN, engportal, mount_health, session_path, write_session};
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_login_stores_session() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    mount_health(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/engineer/login"))
        .and(body_json(json!({ "email": "omar@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-from-login",
            "engineer": { "_id": "e1", "name": "Omar Haddad", "email": "omar@example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    engportal(home.path(), &server)
        .args(["login", "--email", "omar@example.com"])
        .write_stdin("secret\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Omar Haddad"));

    let stored: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(session_path(home.path())).unwrap()).unwrap();
    assert_eq!(stored["engineerToken"], "tok-from-login");
    assert_eq!(stored["engineerInfo"]["name"], "Omar Haddad");
}

#[cfg(unix)]
#[tokio::test]
async fn test_session_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    mount_health(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/engineer/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok",
            "engineer": { "_id": "e1", "name": "Omar" }
        })))
        .mount(&server)
        .await;

    engportal(home.path(), &server)
        .args(["login", "-e", "omar@example.com", "-p", "secret"])
        .assert()
        .success();

    let mode = fs::metadata(session_path(home.path()))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn test_login_with_bad_credentials_fails() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    mount_health(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/engineer/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "message": "Invalid email or password" })),
        )
        .mount(&server)
        .await;

    engportal(home.path(), &server)
        .args(["login", "--email", "omar@example.com", "--password", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Login failed"))
        .stderr(predicate::str::contains("Invalid email or password"))
        .stderr(predicate::str::contains("Session expired").not());

    assert!(!session_path(home.path()).exists());
}

#[tokio::test]
async fn test_login_refused_when_server_offline() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    mount_health(&server, 503).await;
    Mock::given(method("POST"))
        .and(path("/api/engineer/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    engportal(home.path(), &server)
        .args(["login", "--email", "omar@example.com", "--password", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Server is offline"));
}

#[tokio::test]
async fn test_logout_when_not_logged_in() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();

    engportal(home.path(), &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_logout_clears_session_even_if_server_fails() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    write_session(home.path());
    Mock::given(method("POST"))
        .and(path("/api/engineer/logout"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    engportal(home.path(), &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    assert!(!session_path(home.path()).exists());
}

#[tokio::test]
async fn test_status_shows_identity() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    write_session(home.path());
    mount_health(&server, 200).await;

    engportal(home.path(), &server)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Server: online"))
        .stdout(predicate::str::contains(
            "Logged in as Omar Haddad <omar@example.com>",
        ));
}

#[tokio::test]
async fn test_status_offline_keeps_stored_session() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    write_session(home.path());
    mount_health(&server, 500).await;

    engportal(home.path(), &server)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Server: offline"))
        .stdout(predicate::str::contains("Not logged in"));

    assert!(session_path(home.path()).exists());
}
