//! In-memory media storage for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use crate::ports::{MediaError, MediaStorage};

/// Media storage that keeps uploads in a map and resolves references to
/// paths under a fake root. The generation mock never dereferences them.
#[derive(Default)]
pub struct InMemoryMediaStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored bytes for a reference, if any.
    pub fn bytes(&self, image_ref: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(image_ref).cloned()
    }
}

#[async_trait]
impl MediaStorage for InMemoryMediaStorage {
    async fn store(&self, bytes: &[u8], _content_type: &str) -> Result<String, MediaError> {
        let image_ref = format!("chat_images/{}", Uuid::new_v4());
        self.files
            .lock()
            .unwrap()
            .insert(image_ref.clone(), bytes.to_vec());
        Ok(image_ref)
    }

    fn resolve(&self, image_ref: &str) -> PathBuf {
        PathBuf::from("/in-memory").join(image_ref)
    }
}
