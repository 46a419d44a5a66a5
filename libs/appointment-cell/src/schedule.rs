use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use shared_models::error::AppError;

/// Wire format of every slot timestamp.
pub const SLOT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ACCEPTED_TIME_FORMATS: &[&str] = &[
    SLOT_TIME_FORMAT,
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Business-day window and slot length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSchedule {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub slot_minutes: i64,
}

impl Default for SlotSchedule {
    fn default() -> Self {
        Self {
            opens_at: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            closes_at: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 20,
        }
    }
}

impl SlotSchedule {
    /// `[opens_at, closes_at)` on `day`.
    pub fn window(&self, day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (day.and_time(self.opens_at), day.and_time(self.closes_at))
    }

    pub fn slots_per_day(&self) -> i64 {
        if self.slot_minutes <= 0 {
            return 0;
        }
        let open_minutes = (self.closes_at - self.opens_at).num_minutes();
        open_minutes.max(0) / self.slot_minutes
    }
}

/// Calendar day from `YYYY-MM-DD`, or from the date part of a slot timestamp.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_slot_time(raw).map(|time| time.date()))
        .ok_or_else(|| AppError::InvalidDate(format!("'{}' is not a YYYY-MM-DD date", raw)))
}

pub fn parse_slot_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ACCEPTED_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// `YYYYMMDD`, used in record keys and the `date` field.
pub fn date_slug(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}

pub(crate) mod slot_time {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{parse_slot_time, SLOT_TIME_FORMAT};

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(SLOT_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_slot_time(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid slot time '{}'", raw)))
    }
}
