//! Axum routes for chat endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    create_chat, delete_chat, get_chat, list_chats, send_message, update_chat, ChatAppState,
};

/// Creates routes for chat endpoints.
///
/// - `POST /chats` - create a chat
/// - `GET /chats` - list chats, newest-updated first
/// - `GET /chats/:chat_id` - chat detail with messages oldest-first
/// - `PUT /chats/:chat_id` - rename
/// - `DELETE /chats/:chat_id` - delete (cascades to messages)
/// - `POST /chats/:chat_id/messages` - send message, stream the reply
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chats", post(create_chat).get(list_chats))
        .route(
            "/chats/:chat_id",
            get(get_chat).put(update_chat).delete(delete_chat),
        )
        .route("/chats/:chat_id/messages", post(send_message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::memory::{InMemoryMediaStorage, InMemoryMessageStore};
    use crate::adapters::ollama::{MockGenerationClient, ScriptedStream};
    use crate::application::{AuthenticatedUser, ChatSessionService};
    use crate::domain::foundation::UserId;
    use crate::ports::MessageStore;

    fn test_router(store: Arc<InMemoryMessageStore>, generator: MockGenerationClient) -> Router {
        let sessions = Arc::new(ChatSessionService::new(
            Arc::clone(&store) as Arc<dyn MessageStore>,
            Arc::new(generator),
            Arc::new(InMemoryMediaStorage::new()),
        ));
        chat_routes().with_state(ChatAppState { store, sessions })
    }

    fn authed(builder: axum::http::request::Builder, user: UserId) -> axum::http::request::Builder {
        builder.extension(AuthenticatedUser {
            id: user,
            username: "alice".into(),
        })
    }

    #[tokio::test]
    async fn list_chats_rejects_unauthenticated_requests() {
        let app = test_router(Arc::new(InMemoryMessageStore::new()), MockGenerationClient::new());

        let response = app
            .oneshot(Request::builder().uri("/chats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authenticated_list_returns_the_owners_chats() {
        let store = Arc::new(InMemoryMessageStore::new());
        let alice = UserId::new();
        store.create_chat(alice, "trip planning").await.unwrap();
        let app = test_router(store, MockGenerationClient::new());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/chats")
                    .extension(AuthenticatedUser {
                        id: alice,
                        username: "alice".into(),
                    })
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let chats: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0]["title"], "trip planning");
    }

    #[tokio::test]
    async fn unknown_chat_id_is_a_json_404() {
        let store = Arc::new(InMemoryMessageStore::new());
        let alice = UserId::new();
        let app = test_router(store, MockGenerationClient::new());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/chats/{}", uuid::Uuid::new_v4()))
                    .extension(AuthenticatedUser {
                        id: alice,
                        username: "alice".into(),
                    })
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["code"], "not_found");
    }

    #[tokio::test]
    async fn malformed_chat_id_is_a_400() {
        let app = test_router(Arc::new(InMemoryMessageStore::new()), MockGenerationClient::new());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/chats/not-a-uuid")
                    .extension(AuthenticatedUser {
                        id: UserId::new(),
                        username: "alice".into(),
                    })
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn send_message_streams_the_reply_as_plain_text() {
        let store = Arc::new(InMemoryMessageStore::new());
        let alice = UserId::new();
        let chat = store.create_chat(alice, "trip planning").await.unwrap();

        let generator = MockGenerationClient::new();
        generator.script(ScriptedStream::Fragments(vec![
            "Cons".into(),
            "ider ".into(),
            "Japan.".into(),
        ]));
        let app = test_router(Arc::clone(&store), generator);

        let body = concat!(
            "--boundary\r\n",
            "Content-Disposition: form-data; name=\"content\"\r\n\r\n",
            "Where should I go in March?\r\n",
            "--boundary--\r\n",
        );
        let response = app
            .oneshot(
                authed(Request::builder(), alice)
                    .method("POST")
                    .uri(format!("/chats/{}/messages", chat.id))
                    .header("Content-Type", "multipart/form-data; boundary=boundary")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        assert!(response.headers().contains_key("x-message-id"));

        // The chunked body is exactly the fragment concatenation.
        let streamed = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(streamed, "Consider Japan.".as_bytes());

        let detail = store.get_chat(alice, chat.id).await.unwrap();
        assert_eq!(detail.messages[0].content, "Where should I go in March?");
        assert_eq!(detail.messages[0].response.as_deref(), Some("Consider Japan."));
    }

    #[tokio::test]
    async fn send_message_stores_the_image_part_and_forwards_it() {
        let store = Arc::new(InMemoryMessageStore::new());
        let alice = UserId::new();
        let chat = store.create_chat(alice, "pictures").await.unwrap();

        let generator = MockGenerationClient::new();
        generator.script(ScriptedStream::Fragments(vec!["a cat".into()]));
        let images = generator.seen_images();
        let app = test_router(Arc::clone(&store), generator);

        let body = concat!(
            "--boundary\r\n",
            "Content-Disposition: form-data; name=\"content\"\r\n\r\n",
            "what is this?\r\n",
            "--boundary\r\n",
            "Content-Disposition: form-data; name=\"image\"; filename=\"cat.png\"\r\n",
            "Content-Type: image/png\r\n\r\n",
            "png bytes\r\n",
            "--boundary--\r\n",
        );
        let response = app
            .oneshot(
                authed(Request::builder(), alice)
                    .method("POST")
                    .uri(format!("/chats/{}/messages", chat.id))
                    .header("Content-Type", "multipart/form-data; boundary=boundary")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let streamed = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(streamed, "a cat".as_bytes());

        let detail = store.get_chat(alice, chat.id).await.unwrap();
        let image_ref = detail.messages[0].image_ref.clone().unwrap();
        assert!(image_ref.starts_with("chat_images/"));
        assert!(images.lock().unwrap()[0].is_some());
    }
}
