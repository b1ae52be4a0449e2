//! Domain layer - typed records and shared primitives.

pub mod chat;
pub mod foundation;
pub mod user;
