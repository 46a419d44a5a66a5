pub mod session;

pub use session::{generate_token, SessionRegistry};
