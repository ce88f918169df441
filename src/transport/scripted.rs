//! Scripted transport for tests
//!
//! Replays a fixed list of chunks so stream sessions can be exercised without
//! a network, including responses that stall or break mid-body.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use crate::{
    error::TransportError,
    transport::{ByteStream, StreamTransport},
};

/// What happens after the scripted chunks run out
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEnd {
    /// The body ends normally
    Close,
    /// The body never yields again
    Hang,
    /// The body fails with the given error
    Fail(TransportError),
}

/// A recorded `open_stream` call for verification in tests
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedStream {
    pub target: String,
    pub body: String,
}

/// Transport that replays scripted chunks
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    chunks: Vec<Bytes>,
    end: ScriptEnd,
    open_error: Option<TransportError>,
    opened: Arc<Mutex<Vec<OpenedStream>>>,
}

impl ScriptedTransport {
    /// Replay `chunks`, then close the body
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            end: ScriptEnd::Close,
            open_error: None,
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every `open_stream` call with `error`
    pub fn failing(error: TransportError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::new(Vec::<Bytes>::new())
        }
    }

    /// Set what happens after the last chunk
    pub fn ending_with(mut self, end: ScriptEnd) -> Self {
        self.end = end;
        self
    }

    /// All `open_stream` calls so far
    pub fn opened(&self) -> Vec<OpenedStream> {
        self.opened
            .lock()
            .map(|opened| opened.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open_stream(&self, target: &str, body: String) -> Result<ByteStream, TransportError> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(OpenedStream {
                target: target.to_string(),
                body,
            });
        }

        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }

        let chunks = stream::iter(
            self.chunks
                .clone()
                .into_iter()
                .map(Ok::<Bytes, TransportError>),
        );

        let body: ByteStream = match self.end.clone() {
            ScriptEnd::Close => Box::pin(chunks),
            ScriptEnd::Hang => Box::pin(futures::StreamExt::chain(chunks, stream::pending())),
            ScriptEnd::Fail(error) => {
                Box::pin(futures::StreamExt::chain(chunks, stream::once(async move { Err(error) })))
            }
        };

        Ok(body)
    }
}
