//! HTTP adapter for authentication endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::AuthAppState;
pub use routes::auth_routes;
