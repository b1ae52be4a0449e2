//! Generation client adapters.

mod client;
mod mock;

pub use client::OllamaClient;
pub use mock::{MockGenerationClient, ScriptedStream};
