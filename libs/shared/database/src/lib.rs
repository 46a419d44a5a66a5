pub mod error;
pub mod memory;
pub mod redis_json;
pub mod store;

use std::sync::Arc;

use tracing::{info, warn};

use shared_config::{AppConfig, StoreBackend};

pub use error::StoreError;
pub use memory::InMemoryDocumentStore;
pub use redis_json::RedisDocumentStore;
pub use store::{
    DocumentStore, FieldFilter, FieldKind, IndexField, IndexSchema, Lease, SearchDocument,
    SearchQuery,
};

/// Build the store selected by `config.store_backend`.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.store_backend {
        StoreBackend::Redis => {
            info!("Connecting to Redis document store");
            let store = RedisDocumentStore::new(config).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory document store, data will not survive a restart");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
    }
}
