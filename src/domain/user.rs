//! User account record.
//!
//! Credentials never appear here: password hashes live entirely inside the
//! identity adapter, and every external representation of a user is the
//! explicit field list below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::foundation::{UserId, ValidationError};

/// Maximum accepted username length.
pub const MAX_USERNAME_LENGTH: usize = 100;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Validates a username for registration.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field("username"));
    }
    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::too_long("username", MAX_USERNAME_LENGTH));
    }
    Ok(())
}
