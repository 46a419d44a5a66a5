use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{extract::State, Extension, Json};
use serde_json::json;

use auth_cell::handlers::{current_session, login};
use auth_cell::SessionRegistry;
use shared_database::DocumentStore;
use shared_models::auth::{LoginRequest, Role};
use shared_models::error::AppError;
use shared_utils::test_utils::{TestConfig, TestSession};

fn login_request(email: Option<&str>, password: Option<&str>) -> LoginRequest {
    LoginRequest {
        email: email.map(str::to_string),
        password: password.map(str::to_string),
    }
}

#[tokio::test]
async fn test_login_user_role() {
    let (state, _) = TestConfig::default().to_state();

    let result = login(State(state), Json(login_request(Some("alice@user.com"), Some("x")))).await;

    let session = result.unwrap().0;
    assert_eq!(session.email, "alice@user.com");
    assert_eq!(session.name, "alice");
    assert_eq!(session.role, Role::User);
    assert!(!session.token.is_empty());
}

#[tokio::test]
async fn test_login_admin_role() {
    let (state, _) = TestConfig::default().to_state();

    let session = login(State(state), Json(login_request(Some("bob@admin.com"), Some("x"))))
        .await
        .unwrap()
        .0;

    assert_eq!(session.role, Role::Admin);
    assert_eq!(session.name, "bob");
}

#[tokio::test]
async fn test_login_stores_session_under_token() {
    let (state, store) = TestConfig::default().to_state();

    let session = login(State(state), Json(login_request(Some("alice@user.com"), Some("x"))))
        .await
        .unwrap()
        .0;

    let stored = store.get(&session.token).await.unwrap().unwrap();
    assert_eq!(
        stored,
        json!({
            "email": "alice@user.com",
            "token": session.token,
            "name": "alice",
            "role": "user"
        })
    );
}

#[tokio::test]
async fn test_login_missing_fields() {
    let (state, store) = TestConfig::default().to_state();

    for request in [
        login_request(None, Some("x")),
        login_request(Some("alice@user.com"), None),
        login_request(Some("  "), Some("x")),
        login_request(Some("alice@user.com"), Some("")),
    ] {
        let result = login(State(state.clone()), Json(request)).await;
        assert_matches!(result, Err(AppError::InvalidCredentials));
    }

    assert_eq!(store.document_count().await, 0);
}

#[tokio::test]
async fn test_repeated_logins_yield_independent_sessions() {
    let (state, store) = TestConfig::default().to_state();
    let registry = SessionRegistry::new(state.store.clone());
    let request = login_request(Some("alice@user.com"), Some("x"));

    let first = registry.login(&request).await.unwrap();
    let second = registry.login(&request).await.unwrap();

    assert_ne!(first.token, second.token);
    assert_eq!(registry.validate(&first.token).await.unwrap().email, "alice@user.com");
    assert_eq!(registry.validate(&second.token).await.unwrap().email, "alice@user.com");
    assert_eq!(store.document_count().await, 2);
}

#[tokio::test]
async fn test_validate_rejects_unknown_and_admin_tokens() {
    let (state, _) = TestConfig::default().to_state();
    let registry = SessionRegistry::new(state.store.clone());

    assert_matches!(registry.validate("").await, Err(AppError::Unauthorized));
    assert_matches!(registry.validate("does-not-exist").await, Err(AppError::Unauthorized));

    let admin = TestSession::new("bob@admin.com");
    TestSession::seed(state.store.as_ref(), &admin).await;
    assert_matches!(registry.validate(&admin.token).await, Err(AppError::Unauthorized));
    assert_eq!(registry.resolve(&admin.token).await.unwrap(), admin);
}

#[tokio::test]
async fn test_validate_rejects_unreadable_session() {
    let (state, _) = TestConfig::default().to_state();
    state
        .store
        .set("garbage", "$", &json!({"not": "a session"}))
        .await
        .unwrap();

    let registry = SessionRegistry::new(Arc::clone(&state.store));
    assert_matches!(registry.validate("garbage").await, Err(AppError::Unauthorized));
}

#[tokio::test]
async fn test_current_session_echoes_extension() {
    let session = TestSession::new("alice@user.com");

    let response = current_session(Extension(session.clone())).await;

    assert_eq!(response.0, session);
}
