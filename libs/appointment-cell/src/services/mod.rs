pub mod appointments;
pub mod booking;
pub mod slots;

pub use appointments::{register_booking_index, AppointmentQueryService};
pub use booking::BookingEngine;
pub use slots::SlotGenerator;
