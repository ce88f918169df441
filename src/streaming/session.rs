//! Per-request stream session state
//!
//! A session accumulates conversation identity, citations and usage as frames
//! arrive and decides which semantic event each frame produces. It holds no
//! I/O, so every transition can be driven directly in tests.

use serde_json::Value;
use tracing::{debug, warn};

use super::event::{Completion, StreamEvent};
use super::frame::Frame;
use crate::metrics::record_dropped_frame;

/// Lifecycle of a session.
///
/// `Idle -> Open -> Streaming -> Complete | Errored | Aborted`. Terminal
/// phases are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Open,
    Streaming,
    Complete,
    Errored,
    Aborted,
}

impl SessionPhase {
    /// Whether no further events may be produced
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionPhase::Complete | SessionPhase::Errored | SessionPhase::Aborted
        )
    }
}

/// Accumulated state of one streaming request
#[derive(Debug, Clone, Default)]
pub struct StreamSession {
    conversation_id: String,
    citations: Vec<Value>,
    tokens_input: u64,
    tokens_output: u64,
    phase: SessionPhase,
}

impl StreamSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn is_aborted(&self) -> bool {
        self.phase == SessionPhase::Aborted
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn citations(&self) -> &[Value] {
        &self.citations
    }

    pub fn tokens_input(&self) -> u64 {
        self.tokens_input
    }

    pub fn tokens_output(&self) -> u64 {
        self.tokens_output
    }

    /// The connection is established and frames may follow
    pub fn open(&mut self) {
        if self.phase == SessionPhase::Idle {
            self.phase = SessionPhase::Open;
            debug!("Stream session opened");
        }
    }

    /// Apply one decoded frame, returning the event it produces.
    ///
    /// Frames arriving after a terminal transition are ignored.
    pub fn apply(&mut self, frame: &Frame) -> Option<StreamEvent> {
        if self.phase.is_terminal() {
            debug!(event = %frame.event_type, "Ignoring frame after terminal event");
            return None;
        }
        self.phase = SessionPhase::Streaming;

        match frame.event_type.as_str() {
            "conversation_id" => {
                if self.conversation_id.is_empty() {
                    self.conversation_id = frame.data.clone();
                }
                Some(StreamEvent::ConversationId(frame.data.clone()))
            }
            "token" => Some(StreamEvent::Token(frame.data.clone())),
            "block" => match serde_json::from_str::<Value>(&frame.data) {
                Ok(block) => Some(StreamEvent::Block(block)),
                Err(e) => {
                    warn!(error = %e, data_len = frame.data.len(), "Dropping block frame with invalid JSON");
                    record_dropped_frame("block", "invalid_json");
                    None
                }
            },
            "citations" => match serde_json::from_str::<Vec<Value>>(&frame.data) {
                Ok(citations) => {
                    self.citations = citations.clone();
                    Some(StreamEvent::Citations(citations))
                }
                Err(e) => {
                    warn!(error = %e, data_len = frame.data.len(), "Dropping citations frame that is not a JSON array");
                    record_dropped_frame("citations", "invalid_json");
                    None
                }
            },
            "done" => {
                self.apply_usage(&frame.data);
                self.phase = SessionPhase::Complete;
                debug!(
                    tokens_input = self.tokens_input,
                    tokens_output = self.tokens_output,
                    "Stream session complete"
                );
                Some(StreamEvent::Complete(self.completion()))
            }
            "error" => {
                self.phase = SessionPhase::Errored;
                debug!(message = %frame.data, "Stream session received error frame");
                Some(StreamEvent::Error(frame.data.clone()))
            }
            other => {
                debug!(event = %other, "Ignoring unrecognized frame type");
                None
            }
        }
    }

    /// Transport failure: the session errors unless it already ended
    pub fn fail(&mut self, message: impl Into<String>) -> Option<StreamEvent> {
        if self.phase.is_terminal() {
            return None;
        }
        self.phase = SessionPhase::Errored;
        Some(StreamEvent::Error(message.into()))
    }

    /// Caller cancellation. Returns `true` only on the transition itself.
    pub fn abort(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = SessionPhase::Aborted;
        debug!("Stream session aborted");
        true
    }

    /// The body ended without a terminal frame: complete with what we have
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.phase.is_terminal() {
            return None;
        }
        self.phase = SessionPhase::Complete;
        debug!("Stream closed without done frame, completing with accumulated state");
        Some(StreamEvent::Complete(self.completion()))
    }

    fn completion(&self) -> Completion {
        Completion {
            conversation_id: self.conversation_id.clone(),
            citations: self.citations.clone(),
            tokens_input: self.tokens_input,
            tokens_output: self.tokens_output,
        }
    }

    /// Read usage from a `done` payload. Anything missing or malformed counts as 0.
    fn apply_usage(&mut self, data: &str) {
        let payload = match serde_json::from_str::<Value>(data) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                if !data.trim().is_empty() {
                    debug!(data_len = data.len(), "Done frame payload is not a JSON object, usage defaults to 0");
                }
                return;
            }
        };

        self.tokens_input = payload
            .get("tokens_input")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        self.tokens_output = payload
            .get("tokens_output")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        if self.conversation_id.is_empty() {
            if let Some(id) = payload.get("conversation_id").and_then(Value::as_str) {
                self.conversation_id = id.to_string();
            }
        }
    }
}
