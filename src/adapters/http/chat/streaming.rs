//! Chunked-response glue for the delivery channel port.
//!
//! The relay pushes into an mpsc channel; the HTTP handler turns the
//! receiving half into a `text/plain` chunked body. A mid-stream failure
//! surfaces as an `Err` item after the partial bytes, aborting the
//! transfer, so the caller never sees a silently truncated success.

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use futures::stream;
use tokio::sync::mpsc;

use crate::ports::{ChannelClosed, DeliveryChannel, GenerationError};

/// Events carried from the relay task to the response body.
#[derive(Debug)]
pub enum DeliveryEvent {
    Fragment(String),
    End,
    Failed(GenerationError),
}

/// Delivery channel over an mpsc sender.
///
/// A closed receiver (the HTTP connection went away) turns sends into
/// [`ChannelClosed`], which the relay treats as cooperative cancellation.
pub struct ChannelDelivery {
    tx: mpsc::Sender<DeliveryEvent>,
}

impl ChannelDelivery {
    /// Wraps the sending half of a delivery channel.
    pub fn new(tx: mpsc::Sender<DeliveryEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl DeliveryChannel for ChannelDelivery {
    async fn push(&mut self, fragment: String) -> Result<(), ChannelClosed> {
        self.tx
            .send(DeliveryEvent::Fragment(fragment))
            .await
            .map_err(|_| ChannelClosed)
    }

    async fn close(&mut self, error: Option<GenerationError>) {
        let event = match error {
            None => DeliveryEvent::End,
            Some(e) => DeliveryEvent::Failed(e),
        };
        // The caller may already be gone; nothing left to signal then.
        let _ = self.tx.send(event).await;
    }
}

/// Turns delivery events into body chunks.
///
/// Only an explicit `End` event finishes the body cleanly. A sender dropped
/// without closing means the relay task died mid-stream, so that surfaces
/// as an error item too.
fn delivery_stream(
    rx: mpsc::Receiver<DeliveryEvent>,
) -> impl futures::Stream<Item = Result<Bytes, GenerationError>> {
    stream::unfold((rx, false), |(mut rx, done)| async move {
        if done {
            return None;
        }
        match rx.recv().await {
            Some(DeliveryEvent::Fragment(text)) => Some((Ok(Bytes::from(text)), (rx, false))),
            Some(DeliveryEvent::Failed(e)) => Some((Err(e), (rx, true))),
            Some(DeliveryEvent::End) => None,
            None => Some((
                Err(GenerationError::StreamInterrupted(
                    "delivery channel dropped before close".into(),
                )),
                (rx, true),
            )),
        }
    })
}

/// Builds the streamed response body from the receiving half.
pub fn streaming_body(rx: mpsc::Receiver<DeliveryEvent>) -> Body {
    Body::from_stream(delivery_stream(rx))
}
