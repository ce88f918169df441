//! Mock chat backend for testing
//!
//! Provides wiremock-based mocks for the backend chat endpoints:
//! - POST /api/v1/chat/{id}/stream - SSE chat stream
//! - POST /api/v1/chat/{id} - Non-streaming chat
//! - GET /api/v1/chat/{id}/conversations - Conversation list
//! - GET /api/v1/chat/{id}/conversations/{cid} - Conversation history

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::common::constants;

/// Mock chat backend wrapper
pub struct MockChatBackend {
    server: MockServer,
}

impl MockChatBackend {
    /// Start a new mock backend
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the mock server URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Get all received requests (for assertion in tests)
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    fn chat_path(assistant_id: &str) -> String {
        format!("/api/v1/chat/{}", assistant_id)
    }

    // =========================================================================
    // POST /api/v1/chat/{id}/stream - SSE stream
    // =========================================================================

    /// Mock a stream answered with `body`, only for authenticated tenant requests
    pub async fn mock_stream(&self, assistant_id: &str, body: String) {
        Mock::given(method("POST"))
            .and(path(format!("{}/stream", Self::chat_path(assistant_id))))
            .and(header("Authorization", format!("Bearer {}", constants::TEST_API_TOKEN).as_str()))
            .and(header("X-Tenant-ID", constants::TEST_TENANT_ID))
            .and(header("Accept", "text/event-stream"))
            .respond_with(sse_response(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a stream whose response is held back for `delay`
    pub async fn mock_stream_delayed(&self, assistant_id: &str, body: String, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(format!("{}/stream", Self::chat_path(assistant_id))))
            .respond_with(sse_response(body).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    /// Mock a stream request rejected with `status`
    pub async fn mock_stream_status(&self, assistant_id: &str, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(format!("{}/stream", Self::chat_path(assistant_id))))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // POST /api/v1/chat/{id} - Non-streaming chat
    // =========================================================================

    pub async fn mock_chat_success(&self, assistant_id: &str, response: Value) {
        Mock::given(method("POST"))
            .and(path(Self::chat_path(assistant_id)))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_chat_raw(&self, assistant_id: &str, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(Self::chat_path(assistant_id)))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // GET /api/v1/chat/{id}/conversations[/{cid}]
    // =========================================================================

    pub async fn mock_conversations(&self, assistant_id: &str, conversations: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}/conversations", Self::chat_path(assistant_id))))
            .respond_with(ResponseTemplate::new(200).set_body_json(conversations))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_conversation(&self, assistant_id: &str, conversation_id: &str, messages: Value) {
        Mock::given(method("GET"))
            .and(path(format!(
                "{}/conversations/{}",
                Self::chat_path(assistant_id),
                conversation_id
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(messages))
            .mount(&self.server)
            .await;
    }

    /// Mock the backend's "Assistant not found" answer on every chat route
    pub async fn mock_assistant_not_found(&self, assistant_id: &str) {
        Mock::given(wiremock::matchers::path_regex(format!(
            "^{}(/.*)?$",
            Self::chat_path(assistant_id)
        )))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "detail": "Assistant not found"
        })))
        .mount(&self.server)
        .await;
    }
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body.into_bytes(), "text/event-stream")
        .insert_header("Cache-Control", "no-cache")
}

/// Test data builders
pub struct BackendTestData;

impl BackendTestData {
    pub fn citation(chunk_id: &str, filename: &str, page: Option<u32>) -> Value {
        json!({
            "chunk_id": chunk_id,
            "document_id": "d0c00000-0000-4000-8000-000000000003",
            "document_filename": filename,
            "page_number": page,
            "excerpt": "Revenue grew 12% year over year.",
            "score": 0.87
        })
    }

    pub fn chat_response(message: &str) -> Value {
        json!({
            "message": message,
            "conversation_id": constants::TEST_CONVERSATION_ID,
            "citations": [Self::citation("k1", "annual-report.pdf", Some(4))],
            "blocks": [{ "id": "b1", "type": "callout", "payload": { "text": "Note" } }],
            "tokens_input": 120,
            "tokens_output": 35
        })
    }
}
