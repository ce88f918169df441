//! Chat API data models
//!
//! Request and response bodies of the backend's `/chat` router.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Request body for both streaming and non-streaming chat
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_history_messages: Option<u32>,
}

impl ChatRequest {
    /// Start a new conversation with `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            include_history: None,
            max_history_messages: None,
        }
    }

    /// Continue an existing conversation
    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn include_history(mut self, include: bool) -> Self {
        self.include_history = Some(include);
        self
    }

    pub fn max_history_messages(mut self, max: u32) -> Self {
        self.max_history_messages = Some(max);
        self
    }
}

/// Document excerpt backing part of an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub chunk_id: String,
    pub document_id: String,
    pub document_filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub excerpt: String,
    pub score: f64,
}

impl Citation {
    /// Convert the raw citation list of a stream event, skipping records that do not fit
    pub fn from_values(values: &[Value]) -> Vec<Citation> {
        values
            .iter()
            .filter_map(|value| match Citation::deserialize(value) {
                Ok(citation) => Some(citation),
                Err(e) => {
                    debug!(error = %e, "Skipping citation that does not match the expected shape");
                    None
                }
            })
            .collect()
    }
}

/// Generative UI block produced by a tool call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockData {
    pub id: String,
    /// Block kind, e.g. `kpi_cards`, `steps`, `table`, `callout`
    #[serde(rename = "type")]
    pub block_type: String,
    pub payload: Value,
}

impl BlockData {
    /// Convert the raw payload of a `block` event
    pub fn from_value(value: &Value) -> Option<BlockData> {
        BlockData::deserialize(value)
            .map_err(|e| debug!(error = %e, "Block does not match the expected shape"))
            .ok()
    }
}

/// Response of the non-streaming chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub message: String,
    pub conversation_id: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub blocks: Vec<BlockData>,
    pub tokens_input: u64,
    pub tokens_output: u64,
}

/// One entry of an assistant's conversation list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub id: String,
    /// First user message, truncated by the server
    pub title: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_message_at: DateTime<Utc>,
    pub message_count: u64,
}

/// One stored message of a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationMessage {
    pub id: String,
    /// `user` or `assistant`
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub citations: Option<Vec<Value>>,
    #[serde(default)]
    pub blocks: Option<Vec<Value>>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    /// Typed citations of this message
    pub fn typed_citations(&self) -> Vec<Citation> {
        self.citations
            .as_deref()
            .map(Citation::from_values)
            .unwrap_or_default()
    }
}

/// Accept RFC 3339 timestamps as well as offset-less ISO 8601, read as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
