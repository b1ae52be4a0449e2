//! Streaming generation-and-persistence pipeline.
//!
//! `ChatSessionService::send_message` is the only code path that writes a
//! message's `response` and bumps the owning chat's `updated_at`. The flow:
//!
//! 1. Resolve the chat under the caller's ownership (wrong owner looks like
//!    a missing chat).
//! 2. Persist the pending message row before generation starts, so a crash
//!    mid-generation still leaves an auditable record of the attempt.
//! 3. Ask the generation client for a fragment stream.
//! 4. Relay each fragment to the delivery channel as it arrives while
//!    accumulating it.
//! 5. On normal end of stream, finalize: response write plus chat
//!    `updated_at` bump, one atomic store commit.
//! 6. On mid-stream failure, stall, or caller disconnect, persist whatever
//!    accumulated as a partial response instead of discarding it.
//!
//! Each call creates its own message row, so no two generations ever race
//! on the same message.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::foundation::{ChatId, MessageId, UserId};
use crate::ports::{
    DeliveryChannel, FragmentStream, GenerationClient, GenerationError, MediaStorage, MessageStore,
    StoreError,
};

/// An image uploaded alongside a message.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Input to [`ChatSessionService::send_message`].
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    /// May be empty; the backend is still invoked.
    pub content: String,
    pub image: Option<ImageUpload>,
}

impl NewMessage {
    /// Creates a text-only message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            image: None,
        }
    }

    /// Attaches an image.
    pub fn with_image(mut self, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.image = Some(ImageUpload {
            bytes,
            content_type: content_type.into(),
        });
        self
    }
}

/// Errors surfaced before any fragment is streamed to the caller.
///
/// Mid-stream failures never appear here; they travel through the delivery
/// channel's error-close path because response framing has already been
/// committed.
#[derive(Debug, Clone, Error)]
pub enum SendMessageError {
    /// Chat does not exist under the caller's ownership. No message row is
    /// created.
    #[error("chat not found")]
    NotFound,

    /// The backend could not be reached at stream start. The pending
    /// message row remains with `response = null`.
    #[error("generation backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SendMessageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => SendMessageError::NotFound,
            other => SendMessageError::Store(other),
        }
    }
}

/// Upper bounds on backend latency, above which the stream is treated as
/// failed.
#[derive(Debug, Clone, Copy)]
pub struct StreamTimeouts {
    /// Maximum wait for the first fragment.
    pub first_fragment: Duration,
    /// Maximum wait between subsequent fragments.
    pub idle_fragment: Duration,
}

impl Default for StreamTimeouts {
    fn default() -> Self {
        Self {
            first_fragment: Duration::from_secs(30),
            idle_fragment: Duration::from_secs(60),
        }
    }
}

/// Handle to a generation in flight.
///
/// The relay task runs detached; `relay` exists so callers (and tests) can
/// await completion of the persistence side effects.
#[derive(Debug)]
pub struct ActiveGeneration {
    pub message_id: MessageId,
    pub relay: JoinHandle<()>,
}

/// Orchestrates the send-message pipeline over the store, generation, and
/// media ports.
pub struct ChatSessionService {
    store: Arc<dyn MessageStore>,
    generator: Arc<dyn GenerationClient>,
    media: Arc<dyn MediaStorage>,
    timeouts: StreamTimeouts,
}

impl ChatSessionService {
    /// Creates a new service with default timeouts.
    pub fn new(
        store: Arc<dyn MessageStore>,
        generator: Arc<dyn GenerationClient>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            store,
            generator,
            media,
            timeouts: StreamTimeouts::default(),
        }
    }

    /// Overrides the stream timeouts.
    pub fn with_timeouts(mut self, timeouts: StreamTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Builds the single-turn prompt around the user's content.
    fn build_prompt(content: &str) -> String {
        format!("User: {content}\nAI:")
    }

    /// Sends a message to a chat and starts streaming the model's reply
    /// into `channel`.
    ///
    /// Returns once the stream has started; fragment relay and final
    /// persistence continue on the returned task. Errors returned here
    /// occurred before anything was delivered to the caller.
    pub async fn send_message(
        &self,
        owner_id: UserId,
        chat_id: ChatId,
        new_message: NewMessage,
        channel: Box<dyn DeliveryChannel>,
    ) -> Result<ActiveGeneration, SendMessageError> {
        // Ownership check; a chat owned by someone else is NotFound.
        self.store.get_chat(owner_id, chat_id).await?;

        // Store the attachment first so the message row can reference it.
        // A media failure degrades to a text-only message rather than
        // aborting the send.
        let image_ref = match new_message.image {
            Some(ref upload) => {
                match self.media.store(&upload.bytes, &upload.content_type).await {
                    Ok(image_ref) => Some(image_ref),
                    Err(e) => {
                        warn!(%chat_id, error = %e, "failed to store attachment, proceeding text-only");
                        None
                    }
                }
            }
            None => None,
        };

        // Pending row goes in before generation starts.
        let message = self
            .store
            .create_message(
                Some(chat_id),
                owner_id,
                &new_message.content,
                image_ref.as_deref(),
            )
            .await?;

        let prompt = Self::build_prompt(&new_message.content);
        let image_path = image_ref.as_deref().map(|r| self.media.resolve(r));

        let stream = self
            .generator
            .stream(&prompt, image_path.as_deref())
            .await
            .map_err(|e| {
                info!(message_id = %message.id, error = %e, "generation failed before streaming");
                SendMessageError::BackendUnavailable(e.to_string())
            })?;

        let store = Arc::clone(&self.store);
        let timeouts = self.timeouts;
        let message_id = message.id;
        let relay = tokio::spawn(async move {
            relay_stream(store, message_id, stream, channel, timeouts).await;
        });

        Ok(ActiveGeneration { message_id, relay })
    }
}

/// Relays fragments from the backend stream into the delivery channel,
/// accumulating them, and commits the outcome.
///
/// The persisted response always equals the exact in-order concatenation of
/// the fragments received, up to the point of failure.
async fn relay_stream(
    store: Arc<dyn MessageStore>,
    message_id: MessageId,
    mut stream: FragmentStream,
    mut channel: Box<dyn DeliveryChannel>,
    timeouts: StreamTimeouts,
) {
    let mut accumulated = String::new();
    let mut wait = timeouts.first_fragment;

    loop {
        match tokio::time::timeout(wait, stream.next()).await {
            // Normal end of sequence: the single atomic commit.
            Ok(None) => {
                if let Err(e) = store.finalize(message_id, &accumulated).await {
                    error!(%message_id, error = %e, "failed to finalize response");
                }
                channel.close(None).await;
                debug!(%message_id, chars = accumulated.len(), "generation finalized");
                return;
            }
            Ok(Some(Ok(fragment))) => {
                accumulated.push_str(&fragment);
                if channel.push(fragment).await.is_err() {
                    // Caller disconnected: stop pulling, keep what we have.
                    debug!(%message_id, "caller disconnected, persisting partial response");
                    persist_partial(&store, message_id, &accumulated).await;
                    return;
                }
                wait = timeouts.idle_fragment;
            }
            // Backend failed mid-stream.
            Ok(Some(Err(e))) => {
                warn!(%message_id, error = %e, "generation stream interrupted");
                persist_partial(&store, message_id, &accumulated).await;
                channel.close(Some(e)).await;
                return;
            }
            // Stalled backend is treated as a failed stream.
            Err(_) => {
                let e = GenerationError::StreamInterrupted(format!(
                    "no fragment within {}s",
                    wait.as_secs()
                ));
                warn!(%message_id, error = %e, "generation stream stalled");
                persist_partial(&store, message_id, &accumulated).await;
                channel.close(Some(e)).await;
                return;
            }
        }
    }
}

async fn persist_partial(store: &Arc<dyn MessageStore>, message_id: MessageId, partial: &str) {
    if let Err(e) = store.persist_partial(message_id, partial).await {
        error!(%message_id, error = %e, "failed to persist partial response");
    }
}
