use axum::{
    extract::{Json, State},
    Extension,
};
use tracing::debug;

use shared_models::auth::{LoginRequest, Session};
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::services::SessionRegistry;

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>, AppError> {
    debug!("Login attempt");

    let registry = SessionRegistry::new(state.store.clone());
    let session = registry.login(&request).await?;

    Ok(Json(session))
}

pub async fn current_session(Extension(session): Extension<Session>) -> Json<Session> {
    debug!("Session lookup for {}", session.email);
    Json(session)
}
