//! Delivery channel port - transport-facing sink for fragments.
//!
//! The concrete transport (chunked HTTP body, WebSocket, a test buffer) is
//! an adapter concern; the pipeline only needs ordered delivery and an
//! explicit end-of-stream signal that can carry an error.

use async_trait::async_trait;

use super::generation_client::GenerationError;

/// The consumer side of the channel has gone away (caller disconnect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClosed;

/// Port for relaying fragments to the caller as they arrive.
///
/// `push` must be called in fragment order. A `ChannelClosed` return is a
/// cancellation signal: the producer should stop pulling further fragments.
#[async_trait]
pub trait DeliveryChannel: Send {
    /// Forwards one fragment to the caller.
    async fn push(&mut self, fragment: String) -> Result<(), ChannelClosed>;

    /// Signals end of stream. `error` is `Some` when generation failed
    /// after bytes were already delivered.
    async fn close(&mut self, error: Option<GenerationError>);
}
