use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};

use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::schedule::{parse_slot_time, slot_time};

/// One candidate interval of the slot grid. Computed per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(with = "slot_time")]
    pub start_time: NaiveDateTime,
    #[serde(with = "slot_time")]
    pub end_time: NaiveDateTime,
    #[serde(serialize_with = "booked_flag")]
    pub is_booked: bool,
}

fn booked_flag<S: Serializer>(is_booked: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*is_booked))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedSlot {
    #[serde(with = "slot_time")]
    pub start_time: NaiveDateTime,
    #[serde(with = "slot_time")]
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub category: String,
}

impl BookedSlot {
    pub fn interval(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.start_time, self.end_time)
    }
}

/// All reservations of one identity on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub name: String,
    pub email: String,
    pub date: String,
    #[serde(default)]
    pub slots: Vec<BookedSlot>,
}

impl BookingRecord {
    pub fn new(session: &Session, date: String, first: BookedSlot) -> Self {
        Self {
            name: session.name.clone(),
            email: session.email.clone(),
            date,
            slots: vec![first],
        }
    }

    pub fn contains_interval(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.slots.iter().any(|slot| slot.interval() == (start, end))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSlotRequest {
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl BookSlotRequest {
    /// Parsed entry; the interval must be non-empty.
    pub fn to_booked_slot(&self) -> Result<BookedSlot, AppError> {
        let start_time = parse_slot_time(&self.start_time).ok_or_else(|| {
            AppError::InvalidSlot(format!("invalid startTime '{}'", self.start_time))
        })?;
        let end_time = parse_slot_time(&self.end_time).ok_or_else(|| {
            AppError::InvalidSlot(format!("invalid endTime '{}'", self.end_time))
        })?;

        if end_time <= start_time {
            return Err(AppError::InvalidSlot(
                "endTime must be after startTime".to_string(),
            ));
        }

        Ok(BookedSlot {
            start_time,
            end_time,
            category: self.category.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingAck {
    pub booked: bool,
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentQuery {
    pub date: String,
    pub name: Option<String>,
}
