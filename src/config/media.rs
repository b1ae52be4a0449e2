//! Media storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Media storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Root directory for uploaded media
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl MediaConfig {
    /// Validate media configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.root.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("MEDIA__ROOT"));
        }
        Ok(())
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./media")
}
