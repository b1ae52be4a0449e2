//! HTTP adapters - REST surface over the application layer.

pub mod auth;
pub mod chat;
pub mod error;
pub mod middleware;

use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use auth::AuthAppState;
pub use chat::ChatAppState;
pub use error::ApiError;

use middleware::{auth_middleware, AuthState};

/// Assembles the full application router.
///
/// Auth endpoints live under `/api/auth`, chat endpoints under `/api`.
/// The bearer middleware wraps everything; public routes simply pass
/// through without a token.
pub fn app(auth_state: AuthAppState, chat_state: ChatAppState, tokens: AuthState) -> Router {
    Router::new()
        .nest("/api/auth", auth::auth_routes().with_state(auth_state))
        .nest("/api", chat::chat_routes().with_state(chat_state))
        .layer(from_fn_with_state(tokens, auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
