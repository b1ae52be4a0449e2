//! Generation client port - interface to the model backend.
//!
//! Abstracts the generation backend behind a uniform streaming contract:
//! one prompt (optionally with an image attachment) in, one finite,
//! non-restartable sequence of text fragments out. Whether the backend is
//! text-only or multimodal is invisible to callers.

use async_trait::async_trait;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;

/// A finite stream of text fragments in backend emission order.
///
/// An `Err` item terminates the stream and is distinguishable from normal
/// end-of-sequence (the stream simply ending).
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send>>;

/// Errors from the generation backend.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The backend could not be reached before any fragment was produced.
    #[error("generation backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend failed after the stream had started.
    #[error("generation stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// Port for streaming completions from the model backend.
///
/// Consuming the returned stream drives a single backend call; fragments
/// are pushed by the backend as they are produced, not polled one request
/// per fragment.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Starts a generation for `prompt`, optionally attaching the image at
    /// `image`.
    ///
    /// If the image bytes cannot be read the request degrades to text-only
    /// and the failure is logged; it is never fatal to the generation.
    /// A connection failure before any fragment maps to
    /// [`GenerationError::BackendUnavailable`].
    async fn stream(
        &self,
        prompt: &str,
        image: Option<&Path>,
    ) -> Result<FragmentStream, GenerationError>;
}
