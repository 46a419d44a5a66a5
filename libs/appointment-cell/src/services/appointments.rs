use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{DocumentStore, FieldKind, SearchQuery};
use shared_models::error::AppError;

use crate::keys::booking_index_schema;
use crate::models::BookingRecord;
use crate::schedule::{date_slug, parse_date};

pub struct AppointmentQueryService {
    store: Arc<dyn DocumentStore>,
    index_name: String,
    limit: usize,
}

impl AppointmentQueryService {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self {
            store,
            index_name: config.search_index_name.clone(),
            limit: config.search_result_limit,
        }
    }

    /// Booking records for `date`. A filter narrows the result to records
    /// whose name or email equals it.
    pub async fn get_appointments(
        &self,
        date: &str,
        name_filter: Option<&str>,
    ) -> Result<Vec<BookingRecord>, AppError> {
        let slug = date_slug(parse_date(date)?);

        let mut query = SearchQuery::new(self.limit).require("date", FieldKind::Tag, &slug);
        if let Some(filter) = name_filter.map(str::trim).filter(|filter| !filter.is_empty()) {
            query = query
                .any_of("name", FieldKind::Tag, filter)
                .any_of("email", FieldKind::Tag, filter);
        }

        let documents = self.store.search(&self.index_name, &query).await?;
        if documents.len() >= self.limit {
            warn!(
                "Appointment lookup for {} hit the result limit of {}, later records are omitted",
                slug, self.limit
            );
        }

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            match serde_json::from_value::<BookingRecord>(document.value) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable booking record {}: {}", document.id, e),
            }
        }

        debug!("Found {} booking records for {}", records.len(), slug);
        Ok(records)
    }
}

/// Declare the booking search index. Safe to call on every startup.
pub async fn register_booking_index(
    store: &dyn DocumentStore,
    index_name: &str,
) -> Result<(), AppError> {
    store.create_index(&booking_index_schema(index_name)).await?;
    info!("Booking search index {} is ready", index_name);
    Ok(())
}
