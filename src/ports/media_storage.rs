//! Media storage port - blob area for uploaded images.
//!
//! Messages reference images by relative path; the generation client reads
//! the resolved path directly, never through the HTTP layer.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from media storage.
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("failed to store media: {0}")]
    Io(String),
}

/// Port for storing uploaded image bytes.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Stores `bytes` and returns the relative reference to record on the
    /// message (e.g. `chat_images/<uuid>.png`).
    async fn store(&self, bytes: &[u8], content_type: &str) -> Result<String, MediaError>;

    /// Resolves a stored reference to an absolute filesystem path.
    fn resolve(&self, image_ref: &str) -> PathBuf;
}
