//! SSE Chat Stream Integration Tests
//!
//! Tests for POST /chat/{id}/stream through the HTTP transport:
//! - Full exchange decoded into events in wire order
//! - Multi-line data reassembly
//! - Malformed and unknown frames
//! - Request headers and body
//! - Non-2xx responses

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;

use assistant_stream::{
    client::{Citation, ChatRequest},
    streaming::{Completion, StreamEvent},
};

use crate::common::{constants, sse_body, sse_frame, test_client};
use crate::mocks::{BackendTestData, MockChatBackend};

#[tokio::test]
async fn test_stream_full_exchange() {
    let backend = MockChatBackend::start().await;
    let citations = json!([BackendTestData::citation("k1", "annual-report.pdf", Some(4))]);
    let body = sse_body(&[
        ("conversation_id", constants::TEST_CONVERSATION_ID),
        ("token", "Revenue "),
        ("token", "grew."),
        ("citations", &citations.to_string()),
        ("done", r#"{"tokens_input": 120, "tokens_output": 35}"#),
    ]);
    backend.mock_stream(constants::TEST_ASSISTANT_ID, body).await;

    let events: Vec<StreamEvent> = test_client(&backend.uri())
        .stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("How did we do?"))
        .collect()
        .await;

    let citation_list = citations.as_array().unwrap().clone();
    assert_eq!(
        events,
        vec![
            StreamEvent::ConversationId(constants::TEST_CONVERSATION_ID.to_string()),
            StreamEvent::Token("Revenue ".to_string()),
            StreamEvent::Token("grew.".to_string()),
            StreamEvent::Citations(citation_list.clone()),
            StreamEvent::Complete(Completion {
                conversation_id: constants::TEST_CONVERSATION_ID.to_string(),
                citations: citation_list.clone(),
                tokens_input: 120,
                tokens_output: 35,
            }),
        ]
    );

    let typed = Citation::from_values(&citation_list);
    assert_eq!(typed[0].document_filename, "annual-report.pdf");
}

#[tokio::test]
async fn test_stream_sends_request_body() {
    let backend = MockChatBackend::start().await;
    backend
        .mock_stream(constants::TEST_ASSISTANT_ID, sse_frame("done", "{}"))
        .await;

    let request = ChatRequest::new("Follow up")
        .in_conversation(constants::TEST_CONVERSATION_ID)
        .include_history(true);
    let _: Vec<StreamEvent> = test_client(&backend.uri())
        .stream_chat(constants::TEST_ASSISTANT_ID, &request)
        .collect()
        .await;

    let requests = backend.received_requests().await;
    assert_eq!(requests.len(), 1);
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        sent,
        json!({
            "message": "Follow up",
            "conversation_id": constants::TEST_CONVERSATION_ID,
            "include_history": true
        })
    );
}

#[tokio::test]
async fn test_stream_multiline_token_reassembled() {
    let backend = MockChatBackend::start().await;
    let body = sse_body(&[
        ("token", "| a | b |\n|---|---|\n"),
        ("done", "{}"),
    ]);
    backend.mock_stream(constants::TEST_ASSISTANT_ID, body).await;

    let events: Vec<StreamEvent> = test_client(&backend.uri())
        .stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("table"))
        .collect()
        .await;

    assert_eq!(events[0], StreamEvent::Token("| a | b |\n|---|---|\n".to_string()));
}

#[tokio::test]
async fn test_stream_skips_malformed_and_unknown_frames() {
    let backend = MockChatBackend::start().await;
    let body = format!(
        "{}{}{}{}{}",
        sse_frame("start", ""),
        "data: orphan data without an event\n\n",
        sse_frame("block", "{truncated"),
        sse_frame("block", r#"{"id":"b1","type":"steps","payload":{"steps":[]}}"#),
        sse_frame("done", "not json"),
    );
    backend.mock_stream(constants::TEST_ASSISTANT_ID, body).await;

    let events: Vec<StreamEvent> = test_client(&backend.uri())
        .stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("steps"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Block(json!({"id": "b1", "type": "steps", "payload": {"steps": []}})),
            StreamEvent::Complete(Completion::default()),
        ]
    );
}

#[tokio::test]
async fn test_stream_error_frame() {
    let backend = MockChatBackend::start().await;
    let body = sse_body(&[
        ("conversation_id", constants::TEST_CONVERSATION_ID),
        ("error", "LLM provider unavailable"),
    ]);
    backend.mock_stream(constants::TEST_ASSISTANT_ID, body).await;

    let events: Vec<StreamEvent> = test_client(&backend.uri())
        .stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("hi"))
        .collect()
        .await;

    assert_eq!(
        events.last(),
        Some(&StreamEvent::Error("LLM provider unavailable".to_string()))
    );
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_stream_rejected_status_is_single_error() {
    let backend = MockChatBackend::start().await;
    backend
        .mock_stream_status(constants::TEST_ASSISTANT_ID, 500, "internal error")
        .await;

    let events: Vec<StreamEvent> = test_client(&backend.uri())
        .stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("hi"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![StreamEvent::Error(
            "Server responded with status 500: internal error".to_string()
        )]
    );
}

#[tokio::test]
async fn test_stream_close_without_done_completes() {
    let backend = MockChatBackend::start().await;
    let body = format!(
        "{}event: token\ndata: cut off",
        sse_frame("token", "partial answer")
    );
    backend.mock_stream(constants::TEST_ASSISTANT_ID, body).await;

    let events: Vec<StreamEvent> = test_client(&backend.uri())
        .stream_chat(constants::TEST_ASSISTANT_ID, &ChatRequest::new("hi"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Token("partial answer".to_string()),
            StreamEvent::Complete(Completion::default()),
        ]
    );
}
