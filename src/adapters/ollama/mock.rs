//! Scriptable mock generation client for tests and local development.

use async_trait::async_trait;
use futures::stream;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::ports::{FragmentStream, GenerationClient, GenerationError};

/// How one scripted call to [`MockGenerationClient::stream`] behaves.
#[derive(Debug, Clone)]
pub enum ScriptedStream {
    /// Emit these fragments, then end normally.
    Fragments(Vec<String>),
    /// Emit these fragments, then fail mid-stream.
    FragmentsThenError(Vec<String>, String),
    /// Emit these fragments, then never produce another item.
    FragmentsThenStall(Vec<String>),
    /// Fail before the stream starts.
    Unavailable(String),
}

/// Generation client that replays a script and records what it was asked.
#[derive(Clone, Default)]
pub struct MockGenerationClient {
    script: Arc<Mutex<VecDeque<ScriptedStream>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    images: Arc<Mutex<Vec<Option<PathBuf>>>>,
}

impl MockGenerationClient {
    /// Creates a mock with an empty script. Unscripted calls emit nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one scripted response.
    pub fn script(&self, scripted: ScriptedStream) {
        self.script.lock().unwrap().push_back(scripted);
    }

    /// Prompts seen so far, in call order.
    pub fn seen_prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }

    /// Image paths seen so far, in call order.
    pub fn seen_images(&self) -> Arc<Mutex<Vec<Option<PathBuf>>>> {
        Arc::clone(&self.images)
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn stream(
        &self,
        prompt: &str,
        image: Option<&Path>,
    ) -> Result<FragmentStream, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.images
            .lock()
            .unwrap()
            .push(image.map(Path::to_path_buf));

        let scripted = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedStream::Fragments(Vec::new()));

        match scripted {
            ScriptedStream::Fragments(fragments) => {
                Ok(Box::pin(stream::iter(fragments.into_iter().map(Ok))))
            }
            ScriptedStream::FragmentsThenError(fragments, message) => {
                let items = fragments
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(GenerationError::StreamInterrupted(
                        message,
                    ))));
                Ok(Box::pin(stream::iter(items)))
            }
            ScriptedStream::FragmentsThenStall(fragments) => {
                let head = stream::iter(fragments.into_iter().map(Ok));
                Ok(Box::pin(futures::StreamExt::chain(head, stream::pending())))
            }
            ScriptedStream::Unavailable(message) => {
                Err(GenerationError::BackendUnavailable(message))
            }
        }
    }
}
