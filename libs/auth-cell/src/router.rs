use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::AppState;

use crate::handlers;
use crate::middleware::require_session;

pub fn auth_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/login", post(handlers::login));

    let protected_routes = Router::new()
        .route("/session", get(handlers::current_session))
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
