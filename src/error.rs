//! Error types for the assistant stream client
//!
//! Stream sessions never surface these directly: a failed session ends with a
//! `StreamEvent::Error` carrying the error's message. Non-streaming client
//! calls return them as `ClientResult`.

use thiserror::Error;

/// Failures of the byte transport under a stream session
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Server responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Response body failed: {0}")]
    Body(String),
}

impl TransportError {
    /// Classify a reqwest error raised while sending a request
    pub fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }

    /// Classify a reqwest error raised while reading the body
    pub fn from_body(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Body(err.to_string())
        }
    }
}

/// Errors returned by non-streaming client calls
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type ClientResult<T> = Result<T, ClientError>;
