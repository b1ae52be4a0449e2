//! HTTP adapter for chat endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;
pub mod streaming;

pub use handlers::ChatAppState;
pub use routes::chat_routes;
pub use streaming::{streaming_body, ChannelDelivery, DeliveryEvent};
