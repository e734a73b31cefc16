//! Auth gate transitions against a mock service.

mod support;

use std::time::Duration;

use engportal_core::Portal;
use engportal_core::config::Config;
use engportal_core::gate::AuthState;
use engportal_core::session::SessionStore;
use engportal_core::{ApiError, ApiErrorKind};
use engportal_types::Credentials;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{closed_origin, engineer_json, identity, portal_for, session};

async fn mount_health(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

fn credentials() -> Credentials {
    Credentials {
        email: "omar@example.com".to_string(),
        password: "secret".to_string(),
    }
}

#[tokio::test]
async fn test_login_authenticates_and_next_call_carries_token() {
    let server = MockServer::start().await;
    mount_health(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/engineer/login"))
        .and(body_json(json!({ "email": "omar@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-login",
            "engineer": engineer_json()
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/engineer/projects"))
        .and(header("authorization", "Bearer tok-login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (portal, _dir) = portal_for(&server);
    assert_eq!(
        portal.gate.initialize().await,
        AuthState::Unauthenticated {
            server_online: true
        }
    );

    let who = portal.gate.login(&credentials()).await.unwrap();
    assert_eq!(who, identity());
    assert_eq!(
        portal.gate.state(),
        AuthState::Authenticated {
            identity: identity()
        }
    );
    assert_eq!(portal.store.load().unwrap().token, "tok-login");

    portal.api.projects().await.unwrap();
}

#[tokio::test]
async fn test_failed_login_leaves_state_unchanged() {
    let server = MockServer::start().await;
    mount_health(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/engineer/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "message": "Invalid email or password" })),
        )
        .mount(&server)
        .await;

    let (portal, _dir) = portal_for(&server);
    let before = portal.gate.initialize().await;

    let err = portal.gate.login(&credentials()).await.unwrap_err();
    let api_err = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(api_err.kind, ApiErrorKind::Unauthorized);
    assert_eq!(api_err.message, "Invalid email or password");
    assert_eq!(portal.gate.state(), before);
    assert!(portal.store.load().is_none());
}

#[tokio::test]
async fn test_stored_session_resumes_when_server_online() {
    let server = MockServer::start().await;
    mount_health(&server, 200).await;

    let (portal, _dir) = portal_for(&server);
    portal.store.save(&session("tok")).unwrap();

    assert_eq!(
        portal.gate.initialize().await,
        AuthState::Authenticated {
            identity: identity()
        }
    );
}

#[tokio::test]
async fn test_stored_session_with_offline_server_is_unauthenticated_but_kept() {
    let server = MockServer::start().await;
    mount_health(&server, 503).await;

    let (portal, _dir) = portal_for(&server);
    portal.store.save(&session("tok")).unwrap();

    assert_eq!(
        portal.gate.initialize().await,
        AuthState::Unauthenticated {
            server_online: false
        }
    );
    assert_eq!(portal.store.load().unwrap().token, "tok");
}

#[tokio::test]
async fn test_401_moves_gate_to_unauthenticated() {
    let server = MockServer::start().await;
    mount_health(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/api/engineer/projects"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (portal, _dir) = portal_for(&server);
    portal.store.save(&session("tok")).unwrap();
    assert!(portal.gate.initialize().await.is_authenticated());

    let follower = portal.gate.follow_session();
    let mut state = portal.gate.subscribe();

    let (a, b) = tokio::join!(portal.api.projects(), portal.api.projects());
    assert!(a.unwrap_err().is_unauthorized());
    assert!(b.unwrap_err().is_unauthorized());

    tokio::time::timeout(
        Duration::from_secs(2),
        state.wait_for(|s| !s.is_authenticated()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        portal.gate.state(),
        AuthState::Unauthenticated {
            server_online: true
        }
    );
    assert!(portal.store.load().is_none());
    follower.abort();
}

#[tokio::test]
async fn test_logout_clears_even_when_server_rejects() {
    let server = MockServer::start().await;
    mount_health(&server, 200).await;
    Mock::given(method("POST"))
        .and(path("/api/engineer/logout"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (portal, _dir) = portal_for(&server);
    portal.store.save(&session("tok")).unwrap();
    portal.gate.initialize().await;

    assert!(portal.gate.logout().await.unwrap());
    assert!(portal.store.load().is_none());
    assert_eq!(
        portal.gate.state(),
        AuthState::Unauthenticated {
            server_online: true
        }
    );
}

#[tokio::test]
async fn test_logout_clears_when_server_unreachable() {
    let origin = closed_origin();
    let config = Config {
        base_url: format!("{origin}/api"),
        health_url: format!("{origin}/health"),
        timeout_ms: 500,
        probe_timeout_ms: 200,
    };
    let portal = Portal::from_config(&config, SessionStore::in_memory()).unwrap();
    portal.store.save(&session("tok")).unwrap();

    assert!(portal.gate.logout().await.unwrap());
    assert!(portal.store.load().is_none());
    assert_eq!(
        portal.gate.state(),
        AuthState::Unauthenticated {
            server_online: false
        }
    );
}

#[tokio::test]
async fn test_logout_without_session_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/engineer/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (portal, _dir) = portal_for(&server);
    assert!(!portal.gate.logout().await.unwrap());
}
