//! Semantic stream events delivered to callers

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Final summary delivered with a successful completion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Completion {
    /// Conversation identifier, empty if the server never sent one
    pub conversation_id: String,
    /// Last citation list received, empty by default
    pub citations: Vec<Value>,
    pub tokens_input: u64,
    pub tokens_output: u64,
}

/// One semantic event of a chat stream.
///
/// `Complete` and `Error` are terminal: nothing follows them.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Conversation identity, repeated on every `conversation_id` frame
    ConversationId(String),
    /// Raw text token
    Token(String),
    /// Structured UI block, validated as JSON only
    Block(Value),
    /// Replacement citation list
    Citations(Vec<Value>),
    /// Stream finished successfully
    Complete(Completion),
    /// Stream failed, transport or server-side
    Error(String),
}

impl StreamEvent {
    /// Whether the event ends the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete(_) | StreamEvent::Error(_))
    }

    /// Short name for logging and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::ConversationId(_) => "conversation_id",
            StreamEvent::Token(_) => "token",
            StreamEvent::Block(_) => "block",
            StreamEvent::Citations(_) => "citations",
            StreamEvent::Complete(_) => "done",
            StreamEvent::Error(_) => "error",
        }
    }

    /// Deliver the event to the matching observer method
    pub fn dispatch_to<O: StreamObserver + ?Sized>(&self, observer: &mut O) {
        match self {
            StreamEvent::ConversationId(id) => observer.on_conversation_id(id),
            StreamEvent::Token(text) => observer.on_token(text),
            StreamEvent::Block(block) => observer.on_block(block),
            StreamEvent::Citations(citations) => observer.on_citations(citations),
            StreamEvent::Complete(summary) => observer.on_complete(summary),
            StreamEvent::Error(message) => observer.on_error(message),
        }
    }
}

/// Callback-style consumer of stream events.
///
/// Every method defaults to a no-op, so implementors only override what they
/// render.
pub trait StreamObserver: Send {
    fn on_token(&mut self, _text: &str) {}

    fn on_block(&mut self, _block: &Value) {}

    fn on_citations(&mut self, _citations: &[Value]) {}

    fn on_conversation_id(&mut self, _id: &str) {}

    fn on_complete(&mut self, _summary: &Completion) {}

    fn on_error(&mut self, _message: &str) {}
}
