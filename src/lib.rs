//! Assistant Stream - streaming chat client for the assistant backend
//!
//! This library decodes the backend's Server-Sent Events chat stream into
//! typed events, drives stream sessions with cancellation, and wraps the
//! non-streaming chat endpoints.

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod streaming;
pub mod transport;

pub use crate::client::{ChatClient, ChatRequest};
pub use crate::config::Config;
pub use crate::error::{ClientError, ClientResult, TransportError};
pub use crate::streaming::{
    start_stream, CancelHandle, Completion, EventStream, StreamEvent, StreamObserver,
    StreamOptions,
};
pub use crate::transport::{HttpTransport, StreamTransport};
