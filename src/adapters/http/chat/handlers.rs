//! HTTP handlers for chat CRUD and the streaming message endpoint.

use std::sync::Arc;

use axum::extract::{Json, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::debug;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAuth;
use crate::application::{ChatSessionService, NewMessage, SendMessageError};
use crate::domain::foundation::ChatId;
use crate::ports::{MessageStore, StoreError};

use super::dto::{
    ChatDetailView, ChatSummaryView, ChatView, CreateChatRequest, UpdateChatRequest,
};
use super::streaming::{streaming_body, ChannelDelivery};

/// Default title for chats created without one.
const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Buffered fragments between the relay task and the response body.
const DELIVERY_BUFFER: usize = 32;

/// Shared state for chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub store: Arc<dyn MessageStore>,
    pub sessions: Arc<ChatSessionService>,
}

fn parse_chat_id(raw: &str) -> Result<ChatId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid chat ID format".into()))
}

fn map_store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound => ApiError::NotFound("Chat not found".into()),
        StoreError::Database(e) => ApiError::Internal(e),
    }
}

/// POST /api/chats - create a chat.
pub async fn create_chat(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
    body: Option<Json<CreateChatRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let title = body
        .and_then(|Json(body)| body.title)
        .unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string());
    let chat = state
        .store
        .create_chat(user.id, &title)
        .await
        .map_err(map_store_error)?;
    Ok((StatusCode::CREATED, Json(ChatView::from(chat))))
}

/// GET /api/chats - list the caller's chats, newest-updated first.
pub async fn list_chats(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ChatSummaryView>>, ApiError> {
    let chats = state
        .store
        .list_chats(user.id)
        .await
        .map_err(map_store_error)?;
    Ok(Json(chats.into_iter().map(ChatSummaryView::from).collect()))
}

/// GET /api/chats/{id} - chat detail with messages oldest-first.
pub async fn get_chat(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatDetailView>, ApiError> {
    let chat_id = parse_chat_id(&chat_id)?;
    let detail = state
        .store
        .get_chat(user.id, chat_id)
        .await
        .map_err(map_store_error)?;
    Ok(Json(detail.into()))
}

/// PUT /api/chats/{id} - rename a chat.
pub async fn update_chat(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
    Path(chat_id): Path<String>,
    Json(body): Json<UpdateChatRequest>,
) -> Result<Json<ChatView>, ApiError> {
    let chat_id = parse_chat_id(&chat_id)?;
    let chat = state
        .store
        .rename_chat(user.id, chat_id, &body.title)
        .await
        .map_err(map_store_error)?;
    Ok(Json(chat.into()))
}

/// DELETE /api/chats/{id} - delete a chat and its messages.
pub async fn delete_chat(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
    Path(chat_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let chat_id = parse_chat_id(&chat_id)?;
    state
        .store
        .delete_chat(user.id, chat_id)
        .await
        .map_err(map_store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/chats/{id}/messages - send a message, stream the reply.
///
/// Accepts a multipart form with a `content` text field and an optional
/// `image` file part. The response body is `text/plain` chunked transfer:
/// exactly the concatenation of fragments, in order, aborted mid-transfer
/// if generation fails after streaming began.
pub async fn send_message(
    State(state): State<ChatAppState>,
    RequireAuth(user): RequireAuth,
    Path(chat_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let chat_id = parse_chat_id(&chat_id)?;

    let mut new_message = NewMessage::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("content") => {
                new_message.content = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid content field: {e}")))?;
            }
            Some("image") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid image field: {e}")))?;
                new_message = new_message.with_image(bytes.to_vec(), content_type);
            }
            other => {
                debug!(field = ?other, "ignoring unknown multipart field");
            }
        }
    }

    let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
    let active = state
        .sessions
        .send_message(user.id, chat_id, new_message, Box::new(ChannelDelivery::new(tx)))
        .await
        .map_err(|e| match e {
            SendMessageError::NotFound => ApiError::NotFound("Chat not found".into()),
            SendMessageError::BackendUnavailable(e) => ApiError::BadGateway(e),
            SendMessageError::Store(e) => map_store_error(e),
        })?;
    debug!(message_id = %active.message_id, "streaming response started");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header("X-Message-Id", active.message_id.to_string())
        .body(streaming_body(rx))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
