use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_models::error::AppError;
use shared_utils::extractor::extract_session_token;
use shared_utils::AppState;

use crate::services::SessionRegistry;

/// Admits only sessions with the `user` role.
pub async fn require_user_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(request.headers())?;

    let session = SessionRegistry::new(state.store.clone())
        .validate(&token)
        .await?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Admits any valid session.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(request.headers())?;

    let session = SessionRegistry::new(state.store.clone())
        .resolve(&token)
        .await?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
