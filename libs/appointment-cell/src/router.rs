// libs/appointment-cell/src/router.rs
use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use auth_cell::middleware::{require_session, require_user_session};
use shared_utils::AppState;

use crate::handlers;

pub fn appointment_routes(state: AppState) -> Router {
    // Slot browsing and booking are for the user role only
    let user_routes = Router::new()
        .route("/slots", get(handlers::get_slots))
        .route("/slots/book", post(handlers::book_slot))
        .layer(middleware::from_fn_with_state(state.clone(), require_user_session));

    let lookup_routes = Router::new()
        .route("/", get(handlers::get_appointments))
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(user_routes)
        .merge(lookup_routes)
        .with_state(state)
}
