use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{DocumentStore, Lease};
use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::keys::{booking_key, lease_key};
use crate::models::{BookSlotRequest, BookedSlot, BookingAck, BookingRecord};
use crate::schedule::date_slug;

const LEASE_RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Records reservations. Writers for one (identity, day) record are
/// serialized through a store lease, so the duplicate check and the write
/// act as one step.
pub struct BookingEngine {
    store: Arc<dyn DocumentStore>,
    lock_ttl: Duration,
    lock_wait: Duration,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self::with_lock_timing(store, config.booking_lock_ttl(), config.booking_lock_wait())
    }

    pub fn with_lock_timing(
        store: Arc<dyn DocumentStore>,
        lock_ttl: Duration,
        lock_wait: Duration,
    ) -> Self {
        Self {
            store,
            lock_ttl,
            lock_wait,
        }
    }

    pub async fn book_slot(
        &self,
        session: &Session,
        request: &BookSlotRequest,
    ) -> Result<BookingAck, AppError> {
        let entry = request.to_booked_slot()?;
        let day = entry.start_time.date();
        let key = booking_key(&session.email, day);

        let lease = self.acquire_lease(&key).await?;
        let result = self.reserve(&key, session, entry).await;

        if let Err(e) = self.store.release_lease(&lease).await {
            warn!("Failed to release lease on {}: {}", key, e);
        }

        result.map(|()| BookingAck {
            booked: true,
            date: date_slug(day),
        })
    }

    async fn reserve(
        &self,
        key: &str,
        session: &Session,
        entry: BookedSlot,
    ) -> Result<(), AppError> {
        match self.store.get(key).await? {
            None => {
                let record = BookingRecord::new(session, date_slug(entry.start_time.date()), entry);
                let document = encode(&record)?;
                self.store.set(key, "$", &document).await?;
                info!("Created booking record {}", key);
            }
            Some(document) => {
                let record: BookingRecord = serde_json::from_value(document).map_err(|e| {
                    AppError::Internal(format!("Malformed booking record {}: {}", key, e))
                })?;

                if record.contains_interval(entry.start_time, entry.end_time) {
                    warn!(
                        "Slot {} - {} already booked in {}",
                        entry.start_time, entry.end_time, key
                    );
                    return Err(AppError::SlotAlreadyBooked);
                }

                self.store.arr_append(key, "$.slots", &encode(&entry)?).await?;
                info!(
                    "Appended slot to {} ({} entries)",
                    key,
                    record.slots.len() + 1
                );
            }
        }
        Ok(())
    }

    async fn acquire_lease(&self, record_key: &str) -> Result<Lease, AppError> {
        let lease_key = lease_key(record_key);
        let deadline = Instant::now() + self.lock_wait;

        loop {
            if let Some(lease) = self.store.acquire_lease(&lease_key, self.lock_ttl).await? {
                return Ok(lease);
            }

            if Instant::now() >= deadline {
                warn!("Timed out waiting for booking lock on {}", record_key);
                return Err(AppError::StoreUnavailable(format!(
                    "booking record {} is busy",
                    record_key
                )));
            }

            debug!("Booking lock on {} held elsewhere, retrying", record_key);
            sleep(LEASE_RETRY_INTERVAL).await;
        }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(format!("Failed to encode: {}", e)))
}
