// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::Session;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{AppointmentQuery, BookSlotRequest, BookingRecord, Slot, SlotQuery};
use crate::services::{AppointmentQueryService, BookingEngine, SlotGenerator};

pub async fn get_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    debug!("Slot grid requested for {}", query.date);

    let generator = SlotGenerator::new(state.store.clone(), &state.config);
    let slots = generator.generate_slots(&query.date).await?;

    Ok(Json(slots))
}

pub async fn book_slot(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    debug!(
        "Booking {} - {} for {}",
        request.start_time, request.end_time, session.email
    );

    let engine = BookingEngine::new(state.store.clone(), &state.config);
    let ack = engine.book_slot(&session, &request).await?;

    Ok(Json(json!({
        "success": ack.booked,
        "date": ack.date
    })))
}

pub async fn get_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<BookingRecord>>, AppError> {
    debug!("Appointment lookup for {}", query.date);

    let service = AppointmentQueryService::new(state.store.clone(), &state.config);
    let records = service
        .get_appointments(&query.date, query.name.as_deref())
        .await?;

    Ok(Json(records))
}
