use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::{DocumentStore, FieldKind, SearchQuery};
use shared_models::error::AppError;

use crate::models::{BookingRecord, Slot};
use crate::schedule::{date_slug, parse_date, SlotSchedule};

pub struct SlotGenerator {
    store: Arc<dyn DocumentStore>,
    index_name: String,
    page_size: usize,
    schedule: SlotSchedule,
}

impl SlotGenerator {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self {
            store,
            index_name: config.search_index_name.clone(),
            page_size: config.search_result_limit.max(1),
            schedule: SlotSchedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: SlotSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Slot grid for `date`, each slot flagged when any identity holds the
    /// identical interval.
    pub async fn generate_slots(&self, date: &str) -> Result<Vec<Slot>, AppError> {
        let day = parse_date(date)?;
        let (window_start, window_end) = self.schedule.window(day);

        if window_start >= window_end || self.schedule.slot_minutes <= 0 {
            return Err(AppError::InvalidDate(format!(
                "no business window for {}",
                date
            )));
        }

        let booked = self.booked_intervals(&date_slug(day)).await?;
        let step = Duration::minutes(self.schedule.slot_minutes);

        let mut slots = Vec::new();
        let mut current = window_start;

        while current + step <= window_end {
            let slot_end = current + step;
            slots.push(Slot {
                start_time: current,
                end_time: slot_end,
                is_booked: booked.contains(&(current, slot_end)),
            });
            current = slot_end;
        }

        debug!(
            "Generated {} slots for {} ({} booked intervals)",
            slots.len(),
            date,
            booked.len()
        );
        Ok(slots)
    }

    /// Every record of the day, read through the search index page by page.
    async fn booked_intervals(
        &self,
        slug: &str,
    ) -> Result<HashSet<(NaiveDateTime, NaiveDateTime)>, AppError> {
        let mut intervals = HashSet::new();
        let mut offset = 0;

        loop {
            let query = SearchQuery::new(self.page_size)
                .require("date", FieldKind::Tag, slug)
                .starting_at(offset);
            let page = self.store.search(&self.index_name, &query).await?;
            let fetched = page.len();

            for document in page {
                match serde_json::from_value::<BookingRecord>(document.value) {
                    Ok(record) => intervals.extend(record.slots.iter().map(|slot| slot.interval())),
                    Err(e) => warn!("Skipping unreadable booking record {}: {}", document.id, e),
                }
            }

            if fetched < self.page_size {
                break;
            }
            offset += fetched;
        }

        Ok(intervals)
    }
}
