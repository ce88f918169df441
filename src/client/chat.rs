//! Chat API client
//!
//! HTTP client for the backend's per-assistant chat router.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use crate::{
    client::models::{ChatRequest, ChatResponse, ConversationMessage, ConversationSummary},
    config::Config,
    error::{ClientError, ClientResult},
    streaming::{start_stream, EventStream, StreamOptions},
    transport::{headers::build_default_headers, HttpTransport, StreamTransport},
};

/// Chat API client
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    transport: Arc<dyn StreamTransport>,
    stream_options: StreamOptions,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.name())
            .field("stream_options", &self.stream_options)
            .finish()
    }
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            transport: Arc::new(HttpTransport::new(client.clone(), config)),
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            headers: build_default_headers(config),
            stream_options: StreamOptions::default().with_idle_timeout(config.stream_idle_timeout()),
        }
    }

    /// Build the HTTP client from `config` and wrap it
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self::new(client, config))
    }

    /// Stream through `transport` instead of HTTP
    pub fn with_transport(mut self, transport: Arc<dyn StreamTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_stream_options(mut self, options: StreamOptions) -> Self {
        self.stream_options = options;
        self
    }

    /// Stream one chat turn.
    ///
    /// The request is sent when the returned stream is first polled.
    #[instrument(skip(self, request), fields(assistant_id = %assistant_id))]
    pub fn stream_chat(&self, assistant_id: &str, request: &ChatRequest) -> EventStream {
        let url = format!("{}/stream", self.chat_url(assistant_id));
        debug!(url = %url, "Starting chat stream");

        start_stream(
            self.transport.clone(),
            url,
            request,
            self.stream_options.clone(),
        )
    }

    /// Send one chat turn and wait for the full answer
    #[instrument(skip(self, request), fields(assistant_id = %assistant_id))]
    pub async fn chat(&self, assistant_id: &str, request: &ChatRequest) -> ClientResult<ChatResponse> {
        let url = self.chat_url(assistant_id);
        debug!(url = %url, "Sending chat request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send chat request");
                e
            })?;

        let result: ChatResponse = read_json(response, "chat").await?;
        debug!(
            conversation_id = %result.conversation_id,
            tokens_input = result.tokens_input,
            tokens_output = result.tokens_output,
            "Chat request completed"
        );
        Ok(result)
    }

    /// List the most recent conversations of an assistant
    #[instrument(skip(self), fields(assistant_id = %assistant_id))]
    pub async fn list_conversations(&self, assistant_id: &str) -> ClientResult<Vec<ConversationSummary>> {
        let url = format!("{}/conversations", self.chat_url(assistant_id));
        debug!(url = %url, "Fetching conversations");

        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let conversations: Vec<ConversationSummary> = read_json(response, "conversations").await?;
        debug!(count = conversations.len(), "Successfully fetched conversations");
        Ok(conversations)
    }

    /// Fetch the full message history of a conversation, oldest first
    #[instrument(skip(self), fields(assistant_id = %assistant_id, conversation_id = %conversation_id))]
    pub async fn get_conversation(
        &self,
        assistant_id: &str,
        conversation_id: &str,
    ) -> ClientResult<Vec<ConversationMessage>> {
        let url = format!(
            "{}/conversations/{}",
            self.chat_url(assistant_id),
            conversation_id
        );
        debug!(url = %url, "Fetching conversation history");

        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let messages: Vec<ConversationMessage> = read_json(response, "conversation").await?;
        debug!(count = messages.len(), "Successfully fetched conversation history");
        Ok(messages)
    }

    fn chat_url(&self, assistant_id: &str) -> String {
        format!("{}/chat/{}", self.base_url, assistant_id)
    }
}

/// Map the status and parse the body of a non-streaming response
async fn read_json<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> ClientResult<T> {
    let status = response.status();
    debug!(status = %status, "Backend {} response status", what);

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        error!(status = %status, body = %text, "Backend {} request failed", what);

        let message = error_detail(&text);
        if status.as_u16() == 404 {
            return Err(ClientError::NotFound(message));
        }
        return Err(ClientError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, body = %body, "Failed to parse backend {} response", what);
        ClientError::InvalidResponse(format!("Failed to parse {} response: {}", what, e))
    })
}

/// The `detail` of a JSON error body, or the raw body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
