//! PostgreSQL identity adapter with argon2 credential hashing.
//!
//! Passwords are hashed with argon2id and a per-user salt; plaintext never
//! touches the database and comparisons go through constant-time verify.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::UserId;
use crate::domain::user::User;
use crate::ports::{AuthError, IdentityProvider};

/// Postgres error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed identity provider.
#[derive(Clone)]
pub struct PostgresIdentity {
    pool: PgPool,
}

impl PostgresIdentity {
    /// Creates an identity provider over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    fn verify_password(password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl IdentityProvider for PostgresIdentity {
    async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let password_hash = Self::hash_password(password)?;
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, created_at
            "#,
        )
        .bind(UserId::new().as_uuid())
        .bind(username)
        .bind(&password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AuthError::UsernameTaken
            }
            _ => AuthError::Internal(e.to_string()),
        })?;

        Ok(User {
            id: UserId::from_uuid(
                row.try_get::<Uuid, _>("id")
                    .map_err(|e| AuthError::Internal(e.to_string()))?,
            ),
            username: row
                .try_get("username")
                .map_err(|e| AuthError::Internal(e.to_string()))?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| AuthError::Internal(e.to_string()))?,
        })
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .ok_or(AuthError::InvalidCredentials)?;

        let stored_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !Self::verify_password(password, &stored_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(User {
            id: UserId::from_uuid(
                row.try_get::<Uuid, _>("id")
                    .map_err(|e| AuthError::Internal(e.to_string()))?,
            ),
            username: row
                .try_get("username")
                .map_err(|e| AuthError::Internal(e.to_string()))?,
            created_at: row
                .try_get("created_at")
                .map_err(|e| AuthError::Internal(e.to_string()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_never_store_plaintext() {
        let hash = PostgresIdentity::hash_password("hunter2").unwrap();
        assert!(!hash.contains("hunter2"));
        assert!(PostgresIdentity::verify_password("hunter2", &hash));
        assert!(!PostgresIdentity::verify_password("hunter3", &hash));
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        let a = PostgresIdentity::hash_password("hunter2").unwrap();
        let b = PostgresIdentity::hash_password("hunter2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!PostgresIdentity::verify_password("anything", "not-a-hash"));
    }
}
