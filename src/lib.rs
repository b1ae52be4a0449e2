//! streamchat - minimal chat backend with streamed LLM responses.
//!
//! Users authenticate, create chat threads, and send text/image messages;
//! the model's reply is relayed to the caller fragment-by-fragment as a
//! chunked response and durably persisted once the stream ends.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
