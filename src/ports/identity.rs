//! Identity port - credential storage and verification.
//!
//! The core never compares credentials itself and never reads ambient
//! session state; it receives an already-resolved [`UserId`]. This port is
//! what resolves it.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::user::User;

/// Errors from the identity collaborator.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. Deliberately indistinct.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration attempted with a taken username.
    #[error("username already exists")]
    UsernameTaken,

    /// Registration attempted with a malformed username.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// The presented token failed validation.
    #[error("invalid token")]
    InvalidToken,

    /// The presented token has expired.
    #[error("token expired")]
    TokenExpired,

    /// The identity backend itself failed.
    #[error("identity service error: {0}")]
    Internal(String),
}

/// Port for registering and authenticating users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account with a hashed credential.
    async fn register(&self, username: &str, password: &str) -> Result<User, AuthError>;

    /// Verifies a credential and resolves the account.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError>;
}
