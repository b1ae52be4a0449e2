//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Minimum accepted JWT secret length in bytes.
const MIN_SECRET_LENGTH: usize = 32;

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for signing bearer tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if self.jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(ValidationError::JwtSecretTooShort);
        }
        if self.token_ttl_secs <= 0 {
            return Err(ValidationError::InvalidTokenTtl);
        }
        Ok(())
    }
}

fn default_token_ttl() -> i64 {
    // 24 hours
    86_400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_are_rejected() {
        let config = AuthConfig {
            jwt_secret: "short".into(),
            token_ttl_secs: default_token_ttl(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::JwtSecretTooShort)
        ));
    }

    #[test]
    fn long_secrets_pass() {
        let config = AuthConfig {
            jwt_secret: "s".repeat(48),
            token_ttl_secs: default_token_ttl(),
        };
        assert!(config.validate().is_ok());
    }
}
