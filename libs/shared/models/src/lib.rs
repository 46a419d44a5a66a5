pub mod auth;
pub mod error;

pub use auth::{LoginRequest, Role, Session};
pub use error::AppError;
