pub mod handlers;
pub mod keys;
pub mod models;
pub mod router;
pub mod schedule;
pub mod services;

pub use router::appointment_routes;
pub use services::{register_booking_index, AppointmentQueryService, BookingEngine, SlotGenerator};
