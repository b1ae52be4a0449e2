//! Ollama implementation of the generation client port.
//!
//! Speaks Ollama's streaming chat API: one POST to `/api/chat` with
//! `stream: true`, answered with newline-delimited JSON chunks, each
//! carrying a piece of the reply in `message.content` and `done: true` on
//! the last chunk.
//!
//! An attached image is read from disk, base64-encoded, and sent in the
//! same logical turn as the prompt. If the image cannot be read the
//! request degrades to text-only with a logged warning; attachment loss is
//! diagnostic, never fatal to the generation.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::ports::{FragmentStream, GenerationClient, GenerationError};

/// Request body for `/api/chat`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn>,
    stream: bool,
}

/// One turn in the chat request.
#[derive(Debug, Serialize)]
struct ChatTurn {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

/// One NDJSON chunk of the streamed reply.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: ChunkMessage,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// Generation client backed by a local Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Creates a client from configuration.
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    /// Reads and encodes the attachment, or logs and returns `None` on
    /// failure (text-only fallback).
    async fn encode_image(image: Option<&Path>) -> Option<Vec<String>> {
        let path = image?;
        match tokio::fs::read(path).await {
            Ok(bytes) => Some(vec![BASE64.encode(bytes)]),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read attachment, sending text-only request");
                None
            }
        }
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn stream(
        &self,
        prompt: &str,
        image: Option<&Path>,
    ) -> Result<FragmentStream, GenerationError> {
        let images = Self::encode_image(image).await;
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatTurn {
                role: "user",
                content: prompt.to_string(),
                images,
            }],
            stream: true,
        };

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::BackendUnavailable(format!(
                "backend returned {status}"
            )));
        }
        debug!(model = %self.model, "generation stream started");

        // Ollama emits one JSON object per line; a transport chunk may
        // split a line, so buffer until a newline before parsing. A
        // sentinel after the byte stream flushes any unterminated tail.
        let mut buffer = String::new();
        let mut finished = false;
        let fragments = response
            .bytes_stream()
            .map(|chunk| {
                Some(chunk.map_err(|e| GenerationError::StreamInterrupted(e.to_string())))
            })
            .chain(stream::iter([None]))
            .flat_map(move |chunk| {
                let items = match chunk {
                    Some(Ok(bytes)) if !finished => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_lines(&mut buffer, &mut finished)
                    }
                    Some(Err(e)) if !finished => {
                        finished = true;
                        vec![Err(e)]
                    }
                    None if !finished => flush_tail(&mut buffer, &mut finished),
                    _ => Vec::new(),
                };
                stream::iter(items)
            });

        Ok(Box::pin(fragments))
    }
}

/// Parses one NDJSON line into fragment items, setting `finished` on the
/// terminal chunk or on a malformed payload.
fn parse_line(
    line: &str,
    items: &mut Vec<Result<String, GenerationError>>,
    finished: &mut bool,
) {
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<ChatChunk>(line) {
        Ok(parsed) => {
            if !parsed.message.content.is_empty() {
                items.push(Ok(parsed.message.content));
            }
            if parsed.done {
                *finished = true;
            }
        }
        Err(e) => {
            items.push(Err(GenerationError::StreamInterrupted(format!(
                "malformed chunk: {e}"
            ))));
            *finished = true;
        }
    }
}

/// Parses every complete line in `buffer`, leaving a partial trailing line
/// in place for the next transport chunk.
fn drain_lines(
    buffer: &mut String,
    finished: &mut bool,
) -> Vec<Result<String, GenerationError>> {
    let mut items = Vec::new();
    while !*finished {
        let Some(newline) = buffer.find('\n') else { break };
        let line: String = buffer.drain(..=newline).collect();
        parse_line(line.trim(), &mut items, finished);
    }
    items
}

/// Parses whatever remains in `buffer` once the byte stream ends. A final
/// content-bearing line without a trailing newline still counts.
fn flush_tail(
    buffer: &mut String,
    finished: &mut bool,
) -> Vec<Result<String, GenerationError>> {
    let mut items = Vec::new();
    let tail = std::mem::take(buffer);
    parse_line(tail.trim(), &mut items, finished);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_without_images_field_when_absent() {
        let request = ChatRequest {
            model: "gemma3n:e2b",
            messages: vec![ChatTurn {
                role: "user",
                content: "User: hi\nAI:".into(),
                images: None,
            }],
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["messages"][0].get("images").is_none());
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn chat_chunk_parses_content_and_done_flag() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"message":{"content":"Hel"},"done":false}"#).unwrap();
        assert_eq!(chunk.message.content, "Hel");
        assert!(!chunk.done);

        let last: ChatChunk =
            serde_json::from_str(r#"{"message":{"content":""},"done":true}"#).unwrap();
        assert!(last.done);
    }

    #[test]
    fn lines_split_across_transport_chunks_reassemble() {
        let mut buffer = String::new();
        let mut finished = false;

        buffer.push_str(r#"{"message":{"content":"Hel"#);
        assert!(drain_lines(&mut buffer, &mut finished).is_empty());

        buffer.push_str("\"},\"done\":false}\n");
        let items = drain_lines(&mut buffer, &mut finished);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "Hel");
        assert!(!finished);
    }

    #[test]
    fn unterminated_final_line_is_not_discarded() {
        let mut buffer = String::from(r#"{"message":{"content":"tail"},"done":true}"#);
        let mut finished = false;

        // No trailing newline, so line-by-line parsing yields nothing.
        assert!(drain_lines(&mut buffer, &mut finished).is_empty());

        let items = flush_tail(&mut buffer, &mut finished);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "tail");
        assert!(finished);
        assert!(buffer.is_empty());
    }

    #[test]
    fn malformed_line_terminates_with_an_error() {
        let mut buffer = String::from("not json\n");
        let mut finished = false;

        let items = drain_lines(&mut buffer, &mut finished);
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(GenerationError::StreamInterrupted(_))
        ));
        assert!(finished);
    }

    #[tokio::test]
    async fn missing_attachment_falls_back_to_text_only() {
        let encoded =
            OllamaClient::encode_image(Some(Path::new("/definitely/not/there.png"))).await;
        assert!(encoded.is_none());
    }

    #[tokio::test]
    async fn readable_attachment_is_base64_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        tokio::fs::write(&path, b"pixels").await.unwrap();

        let encoded = OllamaClient::encode_image(Some(&path)).await.unwrap();
        assert_eq!(encoded, vec![BASE64.encode(b"pixels")]);
    }
}
