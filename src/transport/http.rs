//! Reqwest-backed stream transport
//!
//! POSTs the JSON request body and hands back the response body as it
//! arrives. The body stream owns the connection; dropping it aborts the
//! request.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::HeaderMap;
use tracing::{debug, error, instrument};

use crate::{
    config::Config,
    error::TransportError,
    transport::{headers::build_stream_headers, ByteStream, StreamTransport},
};

/// HTTP transport for the backend's streaming endpoints
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            headers: build_stream_headers(config),
        }
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self, body), fields(target = %target, body_len = body.len()))]
    async fn open_stream(&self, target: &str, body: String) -> Result<ByteStream, TransportError> {
        let response = self
            .client
            .post(target)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send stream request");
                TransportError::from_send(e)
            })?;

        let status = response.status();
        debug!(status = %status, "Stream response status");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Stream request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from_body));

        Ok(Box::pin(stream))
    }
}
