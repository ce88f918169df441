//! Cancellation and Idle Timeout Integration Tests
//!
//! - Cancelling before the backend answers ends the stream silently
//! - Cancelling between events stops delivery
//! - A silent backend trips the idle timeout

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use pretty_assertions::assert_eq;

use assistant_stream::{
    client::ChatRequest,
    streaming::{spawn_stream, StreamEvent, StreamObserver, StreamOptions},
    transport::{ScriptEnd, ScriptedTransport},
};

use crate::common::{constants, sse_body, sse_frame, test_client};
use crate::mocks::MockChatBackend;

#[derive(Default)]
struct TokenCollector {
    tokens: Vec<String>,
    terminal_calls: usize,
}

impl StreamObserver for TokenCollector {
    fn on_token(&mut self, text: &str) {
        self.tokens.push(text.to_string());
    }

    fn on_complete(&mut self, _summary: &assistant_stream::Completion) {
        self.terminal_calls += 1;
    }

    fn on_error(&mut self, _message: &str) {
        self.terminal_calls += 1;
    }
}

#[tokio::test]
async fn test_cancel_while_waiting_for_response() {
    let backend = MockChatBackend::start().await;
    backend
        .mock_stream_delayed(
            constants::TEST_ASSISTANT_ID,
            sse_frame("done", "{}"),
            Duration::from_secs(5),
        )
        .await;

    let events = test_client(&backend.uri())
        .stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("slow"));
    let cancel = events.cancel_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let collected: Vec<StreamEvent> = events.collect().await;

    assert!(collected.is_empty());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_cancel_mid_stream_with_observer() {
    let transport = ScriptedTransport::new(vec![
        sse_body(&[("token", "one"), ("token", "two")]),
    ])
    .ending_with(ScriptEnd::Hang);

    let client = test_client("http://unused.invalid").with_transport(Arc::new(transport));
    let events = client.stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("hi"));
    let (cancel, task) = spawn_stream(events, TokenCollector::default());

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    cancel.cancel();

    let collector = task.await.unwrap();
    assert_eq!(collector.tokens, vec!["one", "two"]);
    assert_eq!(collector.terminal_calls, 0);
}

#[tokio::test]
async fn test_idle_timeout_against_silent_backend() {
    let backend = MockChatBackend::start().await;
    backend
        .mock_stream_delayed(
            constants::TEST_ASSISTANT_ID,
            sse_frame("done", "{}"),
            Duration::from_secs(5),
        )
        .await;

    let client = test_client(&backend.uri()).with_stream_options(
        StreamOptions::default().with_idle_timeout(Some(Duration::from_millis(200))),
    );

    let events: Vec<StreamEvent> = client
        .stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("slow"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![StreamEvent::Error("stream idle for 0.2 seconds".to_string())]
    );
}

#[tokio::test]
async fn test_sessions_cancel_independently() {
    let hanging = ScriptedTransport::new(vec![sse_frame("token", "first")]).ending_with(ScriptEnd::Hang);
    let finishing = ScriptedTransport::new(vec![sse_body(&[("token", "second"), ("done", "{}")])]);

    let first = test_client("http://unused.invalid").with_transport(Arc::new(hanging));
    let second = test_client("http://unused.invalid").with_transport(Arc::new(finishing));

    let mut first_events = first.stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("a"));
    let second_events = second.stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("b"));

    assert_eq!(
        first_events.next().await,
        Some(StreamEvent::Token("first".to_string()))
    );
    first_events.cancel();

    let second_collected: Vec<StreamEvent> = second_events.collect().await;
    assert_eq!(first_events.next().await, None);
    assert_eq!(second_collected.len(), 2);
    assert!(matches!(second_collected[1], StreamEvent::Complete(_)));
}
