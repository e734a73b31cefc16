//! Shared helpers for integration tests against a mock portal service.

#![allow(dead_code)]

use std::net::TcpListener;

use engportal_core::Portal;
use engportal_core::config::Config;
use engportal_core::session::{FileBackend, SessionStore};
use engportal_types::{Identity, Session};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::MockServer;

pub fn config_for(server: &MockServer) -> Config {
    Config {
        base_url: format!("{}/api", server.uri()),
        health_url: format!("{}/health", server.uri()),
        timeout_ms: 2_000,
        probe_timeout_ms: 300,
    }
}

/// Portal against the mock server with a file-backed store in a temp dir.
pub fn portal_for(server: &MockServer) -> (Portal, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(FileBackend::new(dir.path().join("session.json")));
    let portal = Portal::from_config(&config_for(server), store).unwrap();
    (portal, dir)
}

/// Base URL of a local port nothing is listening on.
pub fn closed_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn identity() -> Identity {
    Identity {
        id: "65f0c1a2b3c4d5e6f7a8b9c0".to_string(),
        name: "Omar Haddad".to_string(),
        email: "omar@example.com".to_string(),
    }
}

pub fn session(token: &str) -> Session {
    Session::new(token, identity())
}

pub fn engineer_json() -> Value {
    json!({
        "_id": "65f0c1a2b3c4d5e6f7a8b9c0",
        "name": "Omar Haddad",
        "email": "omar@example.com"
    })
}

pub fn task_json(id: &str, date: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "title": format!("task {id}"),
        "note": "",
        "date": date,
        "status": status
    })
}
