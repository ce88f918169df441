//! Transport module
//!
//! Delivers raw response bytes from the backend to stream sessions.

pub mod headers;
pub mod http;
pub mod provider;
#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;

pub use http::HttpTransport;
pub use provider::{ByteStream, StreamTransport};
#[cfg(any(test, feature = "test-utils"))]
pub use scripted::{OpenedStream, ScriptEnd, ScriptedTransport};
