//! Generation backend configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Generation backend (Ollama) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name to request
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum wait for the first fragment, in seconds
    #[serde(default = "default_first_fragment_timeout")]
    pub first_fragment_timeout_secs: u64,

    /// Maximum wait between fragments, in seconds
    #[serde(default = "default_idle_fragment_timeout")]
    pub idle_fragment_timeout_secs: u64,
}

impl GenerationConfig {
    /// Get the first-fragment timeout as Duration
    pub fn first_fragment_timeout(&self) -> Duration {
        Duration::from_secs(self.first_fragment_timeout_secs)
    }

    /// Get the inter-fragment timeout as Duration
    pub fn idle_fragment_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_fragment_timeout_secs)
    }

    /// Validate generation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBackendUrl);
        }
        if self.first_fragment_timeout_secs == 0 || self.idle_fragment_timeout_secs == 0 {
            return Err(ValidationError::InvalidStreamTimeout);
        }
        if self.model.is_empty() {
            return Err(ValidationError::MissingRequired("GENERATION__MODEL"));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            first_fragment_timeout_secs: default_first_fragment_timeout(),
            idle_fragment_timeout_secs: default_idle_fragment_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "gemma3n:e2b".to_string()
}

fn default_first_fragment_timeout() -> u64 {
    30
}

fn default_idle_fragment_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GenerationConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let config = GenerationConfig {
            idle_fragment_timeout_secs: 0,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidStreamTimeout)
        ));
    }

    #[test]
    fn non_http_urls_are_rejected() {
        let config = GenerationConfig {
            base_url: "ollama://localhost".into(),
            ..GenerationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBackendUrl)
        ));
    }
}
