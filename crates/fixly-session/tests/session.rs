//! Integration tests for the session lifecycle: login persistence,
//! logout teardown, and resuming a cached token across runs.
//!
//! The realtime endpoint in these tests points at a closed port, which
//! exercises the rule that a missing channel never fails the REST
//! session.

use std::path::Path;
use std::sync::Arc;

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fixly_api::{ApiClient, ApiError, SilentSink, TokenStore};
use fixly_core::AppConfig;
use fixly_session::{SessionError, SessionManager};

fn test_config(api_base_url: &str, token_path: &Path) -> AppConfig {
    AppConfig {
        api_base_url: api_base_url.to_string(),
        // A closed port: first connect attempts fail fast.
        realtime_url: "ws://127.0.0.1:9".to_string(),
        request_timeout_secs: 5,
        geolocation_timeout_secs: 1,
        poll_interval_secs: 10,
        idle_refetch_secs: 30,
        reconnect_max_retries: 1,
        reconnect_base_ms: 10,
        log_level: "info".to_string(),
        token_path: token_path.to_path_buf(),
        fallback_location: None,
    }
}

fn test_manager(server: &MockServer, token_path: &Path) -> (SessionManager, TokenStore) {
    let tokens = TokenStore::new();
    let client = ApiClient::with_base_url(&server.uri(), 5, tokens.clone(), Arc::new(SilentSink))
        .expect("client construction should not fail");
    let config = test_config(&server.uri(), token_path);
    (SessionManager::new(&config, client, tokens.clone()), tokens)
}

fn login_body() -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "token": "jwt-abc",
        "user": { "_id": "u1", "name": "Asha", "email": "asha@example.com" }
    })
}

#[tokio::test]
async fn login_persists_the_token_and_identity() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let token_path = dir.path().join("token");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "asha@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(&server)
        .await;

    let (mut manager, tokens) = test_manager(&server, &token_path);
    let identity = manager
        .login("asha@example.com", "hunter2")
        .await
        .expect("login should succeed");

    assert_eq!(identity.id, "u1");
    assert_eq!(manager.identity().map(|me| me.name.as_str()), Some("Asha"));
    assert!(manager.is_logged_in());
    assert_eq!(tokens.get().await.as_deref(), Some("jwt-abc"));

    let cached = std::fs::read_to_string(&token_path).expect("token file written");
    assert_eq!(cached.trim(), "jwt-abc");

    // The realtime endpoint is unreachable; the session stays up anyway.
    assert!(manager.channel().is_none());
}

#[tokio::test]
async fn rejected_login_leaves_no_session_behind() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let token_path = dir.path().join("token");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "success": false,
            "message": "Invalid credentials"
        })))
        .mount(&server)
        .await;

    let (mut manager, tokens) = test_manager(&server, &token_path);
    let err = manager
        .login("asha@example.com", "wrong")
        .await
        .expect_err("bad credentials must fail");

    assert!(matches!(err, SessionError::Api(ApiError::Unauthorized)));
    assert!(!manager.is_logged_in());
    assert!(tokens.is_empty().await);
    assert!(!token_path.exists(), "no token may be cached");
}

#[tokio::test]
async fn logout_tears_the_session_down() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let token_path = dir.path().join("token");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(&server)
        .await;

    let (mut manager, tokens) = test_manager(&server, &token_path);
    manager
        .login("asha@example.com", "hunter2")
        .await
        .expect("login should succeed");
    manager.logout().await.expect("logout should succeed");

    assert!(!manager.is_logged_in());
    assert!(manager.identity().is_none());
    assert!(tokens.is_empty().await);
    assert!(!token_path.exists(), "cached token must be removed");

    // A second logout is harmless.
    manager.logout().await.expect("repeat logout should succeed");
}

#[tokio::test]
async fn resume_restores_a_cached_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "jwt-cached").expect("seed token file");

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .and(header("authorization", "Bearer jwt-cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "user": { "_id": "u1", "name": "Asha", "email": "asha@example.com" }
        })))
        .mount(&server)
        .await;

    let (mut manager, tokens) = test_manager(&server, &token_path);
    let resumed = manager.resume().await.expect("resume should succeed");

    assert_eq!(resumed.map(|me| me.email), Some("asha@example.com".to_string()));
    assert!(manager.is_logged_in());
    assert_eq!(tokens.get().await.as_deref(), Some("jwt-cached"));
}

#[tokio::test]
async fn resume_with_a_stale_token_reduces_to_logged_out() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "jwt-stale").expect("seed token file");

    Mock::given(method("GET"))
        .and(path("/auth/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "success": false,
            "message": "Not authorized"
        })))
        .mount(&server)
        .await;

    let (mut manager, tokens) = test_manager(&server, &token_path);
    let resumed = manager.resume().await.expect("stale token is not an error");

    assert!(resumed.is_none());
    assert!(!manager.is_logged_in());
    assert!(tokens.is_empty().await, "401 must clear the shared store");
    assert!(!token_path.exists(), "stale cache must be removed");
}

#[tokio::test]
async fn resume_without_a_cache_stays_logged_out() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let token_path = dir.path().join("token");

    let (mut manager, _tokens) = test_manager(&server, &token_path);
    let resumed = manager.resume().await.expect("no cache is not an error");

    assert!(resumed.is_none());
    assert!(!manager.is_logged_in());
    let requests = server
        .received_requests()
        .await
        .expect("requests are recorded");
    assert!(requests.is_empty(), "no cache means no validation call");
}

#[tokio::test]
async fn ensure_channel_requires_a_login() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let token_path = dir.path().join("token");

    let (mut manager, _tokens) = test_manager(&server, &token_path);
    let err = manager
        .ensure_channel()
        .await
        .expect_err("logged out must not connect");
    assert!(matches!(err, SessionError::LoggedOut));
}

#[tokio::test]
async fn ensure_channel_surfaces_an_unreachable_endpoint() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let token_path = dir.path().join("token");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(&server)
        .await;

    let (mut manager, _tokens) = test_manager(&server, &token_path);
    manager
        .login("asha@example.com", "hunter2")
        .await
        .expect("login should succeed");

    let err = manager
        .ensure_channel()
        .await
        .expect_err("closed port must fail the connect");
    assert!(matches!(err, SessionError::Realtime(_)));
}
