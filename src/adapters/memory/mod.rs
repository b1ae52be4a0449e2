//! In-memory adapter implementations for tests and local development.

mod media_storage;
mod message_store;

pub use media_storage::InMemoryMediaStorage;
pub use message_store::InMemoryMessageStore;
