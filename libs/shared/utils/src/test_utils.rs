use std::sync::Arc;

use serde_json::{json, Value};

use shared_config::{AppConfig, StoreBackend};
use shared_database::{DocumentStore, InMemoryDocumentStore};
use shared_models::auth::Session;

use crate::state::AppState;

pub struct TestConfig {
    pub booking_lock_ttl_ms: u64,
    pub booking_lock_wait_ms: u64,
    pub search_index_name: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            booking_lock_ttl_ms: 2_000,
            booking_lock_wait_ms: 1_000,
            search_index_name: "idx:slots".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_backend: StoreBackend::Memory,
            booking_lock_ttl_ms: self.booking_lock_ttl_ms,
            booking_lock_wait_ms: self.booking_lock_wait_ms,
            search_index_name: self.search_index_name.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_state(&self) -> (AppState, Arc<InMemoryDocumentStore>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let state = AppState::new(self.to_app_config(), store.clone() as Arc<dyn DocumentStore>);
        (state, store)
    }
}

pub struct TestSession;

impl TestSession {
    /// Role follows the email, so `alice@user.com` is a user session and
    /// `bob@admin.com` an admin one.
    pub fn new(email: &str) -> Session {
        Session::new(email, format!("token-{}", email))
    }

    /// Store `session` under its token the way a login would.
    pub async fn seed(store: &dyn DocumentStore, session: &Session) {
        let document = serde_json::to_value(session).expect("session serializes");
        store
            .set(&session.token, "$", &document)
            .await
            .expect("seed session");
    }
}

pub struct BookingFixtures;

impl BookingFixtures {
    pub fn record(name: &str, email: &str, date: &str, slots: &[(&str, &str, &str)]) -> Value {
        let slots: Vec<Value> = slots
            .iter()
            .map(|(start, end, category)| {
                json!({
                    "startTime": start,
                    "endTime": end,
                    "category": category
                })
            })
            .collect();

        json!({
            "name": name,
            "email": email,
            "date": date,
            "slots": slots
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.search_index_name, "idx:slots");
        assert!(config.is_configured());
    }

    #[test]
    fn test_session_creation() {
        let user = TestSession::new("alice@user.com");
        assert_eq!(user.name, "alice");
        assert!(user.is_user());

        let admin = TestSession::new("bob@admin.com");
        assert!(!admin.is_user());
        assert_ne!(user.token, admin.token);
    }

    #[tokio::test]
    async fn test_seeded_session_is_readable() {
        let (state, _) = TestConfig::default().to_state();
        let session = TestSession::new("alice@user.com");
        TestSession::seed(state.store.as_ref(), &session).await;

        let stored = state.store.get(&session.token).await.unwrap().unwrap();
        assert_eq!(stored["email"], "alice@user.com");
    }

    #[test]
    fn test_booking_record_fixture() {
        let record = BookingFixtures::record(
            "alice",
            "alice@user.com",
            "20240501",
            &[("2024-05-01T10:00:00", "2024-05-01T10:20:00", "consultation")],
        );
        assert_eq!(record["slots"].as_array().unwrap().len(), 1);
    }
}
