//! Local filesystem media storage.
//!
//! Uploaded images land under `<root>/chat_images/<uuid>.<ext>`; messages
//! record the path relative to the root so the media directory can move
//! without rewriting rows.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::ports::{MediaError, MediaStorage};

/// Subdirectory for chat image uploads.
const IMAGE_DIR: &str = "chat_images";

/// Media storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    /// Creates storage rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Maps a content type to a file extension, defaulting to `bin`.
    fn extension_for(content_type: &str) -> &'static str {
        match content_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(&self, bytes: &[u8], content_type: &str) -> Result<String, MediaError> {
        let dir = self.root.join(IMAGE_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), Self::extension_for(content_type));
        fs::write(dir.join(&file_name), bytes)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        Ok(format!("{IMAGE_DIR}/{file_name}"))
    }

    fn resolve(&self, image_ref: &str) -> PathBuf {
        self.root.join(image_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_bytes_and_resolves_the_reference() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path());

        let image_ref = storage.store(b"png bytes", "image/png").await.unwrap();
        assert!(image_ref.starts_with("chat_images/"));
        assert!(image_ref.ends_with(".png"));

        let stored = tokio::fs::read(storage.resolve(&image_ref)).await.unwrap();
        assert_eq!(stored, b"png bytes");
    }

    #[tokio::test]
    async fn unknown_content_types_get_a_bin_extension() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path());

        let image_ref = storage.store(b"??", "application/octet-stream").await.unwrap();
        assert!(image_ref.ends_with(".bin"));
    }
}
