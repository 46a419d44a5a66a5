use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Store operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Search error: {0}")]
    Search(String),

    #[error("No document at key {0}")]
    MissingDocument(String),

    #[error("Unsupported JSON path: {0}")]
    InvalidPath(String),

    #[error("Wrong type at {key}{path}: expected {expected}")]
    WrongType {
        key: String,
        path: String,
        expected: &'static str,
    },
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Search(msg) => AppError::SearchFailure(msg),
            StoreError::Serialization(e) => AppError::Internal(format!("Malformed document: {}", e)),
            other => AppError::StoreUnavailable(other.to_string()),
        }
    }
}
