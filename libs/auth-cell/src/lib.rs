pub mod handlers;
pub mod middleware;
pub mod router;
pub mod services;

pub use router::auth_routes;
pub use services::SessionRegistry;
