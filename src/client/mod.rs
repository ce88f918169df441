//! Chat backend client
//!
//! Streaming and non-streaming access to an assistant's chat endpoints.

pub mod chat;
pub mod models;

pub use chat::ChatClient;
pub use models::{
    BlockData, ChatRequest, ChatResponse, Citation, ConversationMessage, ConversationSummary,
};
