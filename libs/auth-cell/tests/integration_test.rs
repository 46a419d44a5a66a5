use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::router::auth_routes;
use shared_utils::test_utils::{TestConfig, TestSession};
use shared_utils::AppState;

fn create_test_app(state: AppState) -> Router {
    auth_routes(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn login_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_login_endpoint() {
    let (state, _) = TestConfig::default().to_state();
    let app = create_test_app(state);

    let response = app
        .oneshot(login_request(json!({"email": "alice@user.com", "password": "x"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["email"], "alice@user.com");
    assert_eq!(json_response["name"], "alice");
    assert_eq!(json_response["role"], "user");
    assert!(json_response["token"].as_str().is_some());
}

#[tokio::test]
async fn test_login_endpoint_invalid_credentials() {
    let (state, _) = TestConfig::default().to_state();
    let app = create_test_app(state);

    let response = app
        .oneshot(login_request(json!({"email": "alice@user.com"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid Credentials");
}

#[tokio::test]
async fn test_session_endpoint_accepts_raw_and_bearer_tokens() {
    let (state, _) = TestConfig::default().to_state();
    let session = TestSession::new("bob@admin.com");
    TestSession::seed(state.store.as_ref(), &session).await;

    for header in [session.token.clone(), format!("Bearer {}", session.token)] {
        let app = create_test_app(state.clone());
        let request = Request::builder()
            .method("GET")
            .uri("/session")
            .header("authorization", header)
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["email"], "bob@admin.com");
    }
}

#[tokio::test]
async fn test_session_endpoint_unauthorized() {
    let (state, _) = TestConfig::default().to_state();
    let app = create_test_app(state.clone());

    let request = Request::builder()
        .method("GET")
        .uri("/session")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let app = create_test_app(state);
    let request = Request::builder()
        .method("GET")
        .uri("/session")
        .header("authorization", "unknown-token")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
