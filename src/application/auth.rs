//! Authentication use-cases: register, login, token verification.
//!
//! Credential verification is delegated to the [`IdentityProvider`] port;
//! this layer only turns a verified account into a signed bearer token and
//! back. Logout is a client-side token discard, so there is no server-side
//! session state here.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domain::foundation::UserId;
use crate::domain::user::{validate_username, User};
use crate::ports::{AuthError, IdentityProvider};

/// The user resolved from a bearer token, as injected into request
/// extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub username: String,
}

/// JWT claims carried in issued tokens.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: Uuid,
    /// Username, to avoid a DB round trip on every request.
    name: String,
    /// Expiry (seconds since epoch).
    exp: i64,
    /// Issued-at (seconds since epoch).
    iat: i64,
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer from the shared secret and token lifetime in
    /// seconds.
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Signs a token for an authenticated user.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: *user.id.as_uuid(),
            name: user.username.clone(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Verifies a token and returns the user it was issued to.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            },
        )?;
        Ok(AuthenticatedUser {
            id: UserId::from_uuid(data.claims.sub),
            username: data.claims.name,
        })
    }
}

/// Register/login flows over the identity port.
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    tokens: TokenIssuer,
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(identity: Arc<dyn IdentityProvider>, tokens: TokenIssuer) -> Self {
        Self { identity, tokens }
    }

    /// Registers a new account and logs it in.
    pub async fn register(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
        validate_username(username).map_err(|e| AuthError::InvalidUsername(e.to_string()))?;
        let user = self.identity.register(username.trim(), password).await?;
        info!(user_id = %user.id, "user registered");
        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }

    /// Verifies credentials and issues a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
        let user = self.identity.authenticate(username.trim(), password).await?;
        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }
}
