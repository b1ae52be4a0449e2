//! End-to-end pipeline tests over the in-memory adapters.
//!
//! Exercises the full send-message flow (service + delivery channel glue)
//! the way the HTTP layer drives it, without a running server.

use std::sync::Arc;

use proptest::prelude::*;
use tokio::sync::mpsc;

use streamchat::adapters::http::chat::{ChannelDelivery, DeliveryEvent};
use streamchat::adapters::memory::{InMemoryMediaStorage, InMemoryMessageStore};
use streamchat::adapters::ollama::{MockGenerationClient, ScriptedStream};
use streamchat::application::{ChatSessionService, NewMessage, SendMessageError};
use streamchat::domain::chat::ResponseStatus;
use streamchat::domain::foundation::UserId;
use streamchat::ports::MessageStore;

fn service(
    store: &Arc<InMemoryMessageStore>,
    generator: MockGenerationClient,
) -> ChatSessionService {
    ChatSessionService::new(
        Arc::clone(store) as Arc<dyn MessageStore>,
        Arc::new(generator),
        Arc::new(InMemoryMediaStorage::new()),
    )
}

/// Drains the delivery channel the way the HTTP body does, returning the
/// delivered fragments and whether the stream closed with an error.
async fn drain(mut rx: mpsc::Receiver<DeliveryEvent>) -> (Vec<String>, bool) {
    let mut fragments = Vec::new();
    let mut failed = false;
    while let Some(event) = rx.recv().await {
        match event {
            DeliveryEvent::Fragment(text) => fragments.push(text),
            DeliveryEvent::End => break,
            DeliveryEvent::Failed(_) => {
                failed = true;
                break;
            }
        }
    }
    (fragments, failed)
}

#[tokio::test]
async fn alice_plans_a_trip() {
    let store = Arc::new(InMemoryMessageStore::new());
    let alice = UserId::new();
    let chat = store.create_chat(alice, "trip planning").await.unwrap();
    let updated_before = chat.updated_at;

    let generator = MockGenerationClient::new();
    generator.script(ScriptedStream::Fragments(vec![
        "Cons".into(),
        "ider ".into(),
        "Japan.".into(),
    ]));

    let (tx, rx) = mpsc::channel(32);
    let service = service(&store, generator);
    let active = service
        .send_message(
            alice,
            chat.id,
            NewMessage::text("Where should I go in March?"),
            Box::new(ChannelDelivery::new(tx)),
        )
        .await
        .unwrap();

    let (fragments, failed) = drain(rx).await;
    active.relay.await.unwrap();

    assert_eq!(fragments, vec!["Cons", "ider ", "Japan."]);
    assert_eq!(fragments.concat(), "Consider Japan.");
    assert!(!failed);

    let detail = store.get_chat(alice, chat.id).await.unwrap();
    assert_eq!(detail.messages[0].response.as_deref(), Some("Consider Japan."));
    assert_eq!(detail.messages[0].response_status, ResponseStatus::Complete);
    assert!(detail.chat.updated_at > updated_before);
}

#[tokio::test]
async fn unavailable_backend_yields_single_error_and_null_response() {
    let store = Arc::new(InMemoryMessageStore::new());
    let alice = UserId::new();
    let chat = store.create_chat(alice, "trip planning").await.unwrap();
    let updated_before = chat.updated_at;

    let generator = MockGenerationClient::new();
    generator.script(ScriptedStream::Unavailable("connection refused".into()));

    let (tx, rx) = mpsc::channel(32);
    let service = service(&store, generator);
    let result = service
        .send_message(
            alice,
            chat.id,
            NewMessage::text("Where should I go in March?"),
            Box::new(ChannelDelivery::new(tx)),
        )
        .await;

    assert!(matches!(result, Err(SendMessageError::BackendUnavailable(_))));

    // Nothing was ever streamed.
    let (fragments, failed) = drain(rx).await;
    assert!(fragments.is_empty());
    assert!(!failed);

    let detail = store.get_chat(alice, chat.id).await.unwrap();
    assert_eq!(detail.messages.len(), 1);
    assert_eq!(detail.messages[0].response, None);
    assert_eq!(detail.chat.updated_at, updated_before);
}

#[tokio::test]
async fn interrupted_stream_delivers_partial_then_error() {
    let store = Arc::new(InMemoryMessageStore::new());
    let alice = UserId::new();
    let chat = store.create_chat(alice, "greetings").await.unwrap();

    let generator = MockGenerationClient::new();
    generator.script(ScriptedStream::FragmentsThenError(
        vec!["Hel".into(), "lo".into()],
        "backend dropped".into(),
    ));

    let (tx, rx) = mpsc::channel(32);
    let service = service(&store, generator);
    let active = service
        .send_message(
            alice,
            chat.id,
            NewMessage::text("hi"),
            Box::new(ChannelDelivery::new(tx)),
        )
        .await
        .unwrap();

    let (fragments, failed) = drain(rx).await;
    active.relay.await.unwrap();

    // Partial bytes arrived, then an explicit failure signal - never a
    // silent truncation.
    assert_eq!(fragments.concat(), "Hello");
    assert!(failed);

    let detail = store.get_chat(alice, chat.id).await.unwrap();
    assert_eq!(detail.messages[0].response.as_deref(), Some("Hello"));
    assert_eq!(detail.messages[0].response_status, ResponseStatus::Partial);
}

#[tokio::test]
async fn successful_sends_reorder_the_chat_list() {
    let store = Arc::new(InMemoryMessageStore::new());
    let alice = UserId::new();
    let older = store.create_chat(alice, "older").await.unwrap();
    let newer = store.create_chat(alice, "newer").await.unwrap();

    let listed = store.list_chats(alice).await.unwrap();
    assert_eq!(listed[0].id, newer.id);

    let generator = MockGenerationClient::new();
    generator.script(ScriptedStream::Fragments(vec!["reply".into()]));

    let (tx, rx) = mpsc::channel(32);
    let service = service(&store, generator);
    let active = service
        .send_message(
            alice,
            older.id,
            NewMessage::text("bump me"),
            Box::new(ChannelDelivery::new(tx)),
        )
        .await
        .unwrap();
    drain(rx).await;
    active.relay.await.unwrap();

    // The finalized exchange moved the older chat to the top.
    let listed = store.list_chats(alice).await.unwrap();
    assert_eq!(listed[0].id, older.id);
    assert_eq!(listed[0].last_message.as_deref(), Some("bump me"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The persisted response always equals the exact in-order
    /// concatenation of the fragments delivered to the caller.
    #[test]
    fn persisted_response_equals_delivered_concatenation(
        fragments in proptest::collection::vec(".{0,12}", 0..16)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            let store = Arc::new(InMemoryMessageStore::new());
            let owner = UserId::new();
            let chat = store.create_chat(owner, "prop").await.unwrap();

            let generator = MockGenerationClient::new();
            generator.script(ScriptedStream::Fragments(fragments.clone()));

            let (tx, rx) = mpsc::channel(32);
            let service = service(&store, generator);
            let active = service
                .send_message(
                    owner,
                    chat.id,
                    NewMessage::text("anything"),
                    Box::new(ChannelDelivery::new(tx)),
                )
                .await
                .unwrap();

            let (delivered, failed) = drain(rx).await;
            active.relay.await.unwrap();

            prop_assert!(!failed);
            let detail = store.get_chat(owner, chat.id).await.unwrap();
            let expected = delivered.concat();
            prop_assert_eq!(
                detail.messages[0].response.as_deref(),
                Some(expected.as_str())
            );
            Ok(())
        })?;
    }
}
