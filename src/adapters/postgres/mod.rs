//! PostgreSQL adapter implementations.

mod chat_store;
mod identity;

pub use chat_store::PostgresMessageStore;
pub use identity::PostgresIdentity;
