//! Application layer - use-case orchestration over the ports.

pub mod auth;
pub mod chat_session;

pub use auth::{AuthService, AuthenticatedUser, TokenIssuer};
pub use chat_session::{
    ActiveGeneration, ChatSessionService, NewMessage, SendMessageError, StreamTimeouts,
};
