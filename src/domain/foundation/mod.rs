//! Foundation module - shared domain primitives.
//!
//! Identifier newtypes and error types that form the vocabulary of the
//! chat domain.

mod errors;
mod ids;

pub use errors::ValidationError;
pub use ids::{ChatId, MessageId, UserId};
