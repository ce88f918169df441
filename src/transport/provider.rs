//! Stream transport abstraction layer
//!
//! Defines the seam between a stream session and whatever delivers the raw
//! response bytes, so sessions can be driven by reqwest in production and by
//! scripted chunks in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::error::TransportError;

/// Response body as delivered by a transport, in arrival order
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Trait defining how a stream session reaches the backend
///
/// An implementation opens exactly one connection per `open_stream` call and
/// never retries. Dropping the returned stream must release the connection.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Get the transport name for logging and metrics
    fn name(&self) -> &'static str;

    /// Send `body` to `target` and return the response body as a byte stream.
    ///
    /// Fails before any byte is delivered when the connection cannot be
    /// established or the server answers with a non-2xx status.
    async fn open_stream(&self, target: &str, body: String) -> Result<ByteStream, TransportError>;
}
