//! Stream session controller
//!
//! Drives one streaming request end to end: opens the transport, decodes
//! arriving bytes into frames, feeds them through a [`StreamSession`] and
//! hands the resulting [`StreamEvent`]s to the caller in wire order.
//!
//! Each session runs on its own driver task, which owns the response body and
//! forwards events over a channel. The task watches the cancellation token
//! while it waits, so cancelling releases the connection whether or not the
//! caller polls again.
//!
//! Sessions share nothing. Each owns its decoders, its session state and its
//! cancellation token, so any number can run concurrently.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::event::{StreamEvent, StreamObserver};
use super::frame::FrameDecoder;
use super::session::StreamSession;
use super::utf8::Utf8ChunkDecoder;
use crate::error::TransportError;
use crate::metrics::{record_event, record_session_outcome, record_session_started, SessionOutcome};
use crate::transport::{ByteStream, StreamTransport};

/// Events buffered between a driver task and its caller
const EVENT_BUFFER: usize = 64;

/// Per-session options
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Fail the session when the transport is silent for this long
    pub idle_timeout: Option<Duration>,
}

impl StreamOptions {
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

/// Cancels one stream session.
///
/// Cloneable and idempotent. Cancelling closes the connection right away and
/// the session delivers no further events, including ones already decoded
/// but not yet handed out.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    fn new() -> Self {
        Self::default()
    }

    /// Abort the session and its connection
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Events of one stream session, in the order their frames arrived.
///
/// Dropping the stream stops its driver task.
pub struct EventStream {
    inner: Pin<Box<dyn Stream<Item = StreamEvent> + Send>>,
    handle: CancelHandle,
    _driver: DropGuard,
    finished: bool,
}

impl EventStream {
    /// Handle that cancels this session
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// Cancel this session
    pub fn cancel(&self) {
        self.handle.cancel();
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("cancelled", &self.handle.is_cancelled())
            .field("finished", &self.finished)
            .finish()
    }
}

impl Stream for EventStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

/// Outcome of waiting on the transport
enum Step {
    Chunk(Bytes),
    Closed,
    Failed(TransportError),
    IdleTimeout(Duration),
    Cancelled,
}

/// Await `future`, giving up after `limit` if one is set
async fn within<F: Future>(limit: Option<Duration>, future: F) -> Result<F::Output, Duration> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future).await.map_err(|_| limit),
        None => Ok(future.await),
    }
}

async fn next_step(
    body: &mut ByteStream,
    token: &CancellationToken,
    idle_timeout: Option<Duration>,
) -> Step {
    tokio::select! {
        biased;
        _ = token.cancelled() => Step::Cancelled,
        next = within(idle_timeout, body.next()) => match next {
            Ok(Some(Ok(chunk))) => Step::Chunk(chunk),
            Ok(Some(Err(e))) => Step::Failed(e),
            Ok(None) => Step::Closed,
            Err(limit) => Step::IdleTimeout(limit),
        },
    }
}

fn idle_message(limit: Duration) -> String {
    format!("stream idle for {} seconds", limit.as_secs_f64())
}

fn abort_session(session: &mut StreamSession) {
    if session.abort() {
        debug!("Stream session cancelled by caller");
        record_session_outcome(SessionOutcome::Aborted);
    }
}

fn outcome_of(event: &StreamEvent) -> SessionOutcome {
    match event {
        StreamEvent::Error(_) => SessionOutcome::Error,
        _ => SessionOutcome::Complete,
    }
}

/// Send events to the caller in order.
///
/// Returns `false` once the session is cancelled or the caller is gone.
async fn deliver(
    session: &mut StreamSession,
    pending: impl IntoIterator<Item = StreamEvent>,
    events: &mpsc::Sender<StreamEvent>,
    token: &CancellationToken,
) -> bool {
    for event in pending {
        let kind = event.kind();
        let outcome = event.is_terminal().then(|| outcome_of(&event));

        let sent = tokio::select! {
            biased;
            _ = token.cancelled() => false,
            sent = events.send(event) => sent.is_ok(),
        };
        if !sent {
            abort_session(session);
            return false;
        }

        record_event(kind);
        if let Some(outcome) = outcome {
            record_session_outcome(outcome);
        }
    }
    true
}

/// Run one session on its own task. The response body is dropped, and the
/// connection with it, as soon as this returns.
#[instrument(skip_all, fields(session_id = %session_id, target = %target))]
async fn drive_session<T>(
    transport: Arc<T>,
    target: String,
    body: Result<String, serde_json::Error>,
    options: StreamOptions,
    token: CancellationToken,
    events: mpsc::Sender<StreamEvent>,
    session_id: String,
) where
    T: StreamTransport + ?Sized,
{
    let mut session = StreamSession::new();
    record_session_started(transport.name());
    debug!(transport = transport.name(), "Starting stream session");

    let body = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Failed to encode stream request");
            let failure = session.fail(format!("Failed to encode request: {}", e));
            deliver(&mut session, failure, &events, &token).await;
            return;
        }
    };

    let opened = tokio::select! {
        biased;
        _ = token.cancelled() => None,
        result = within(options.idle_timeout, transport.open_stream(&target, body)) => Some(result),
    };

    let opened = match opened {
        None => {
            abort_session(&mut session);
            return;
        }
        Some(Ok(Ok(bytes))) => Ok(bytes),
        Some(Ok(Err(e))) => Err(e.to_string()),
        Some(Err(limit)) => Err(idle_message(limit)),
    };

    let mut bytes = match opened {
        Ok(bytes) => {
            session.open();
            bytes
        }
        Err(message) => {
            warn!(error = %message, "Failed to open stream");
            if token.is_cancelled() {
                abort_session(&mut session);
                return;
            }
            let failure = session.fail(message);
            deliver(&mut session, failure, &events, &token).await;
            return;
        }
    };

    let mut text = Utf8ChunkDecoder::new();
    let mut frames = FrameDecoder::new();

    loop {
        let pending: Vec<StreamEvent> = match next_step(&mut bytes, &token, options.idle_timeout).await {
            Step::Chunk(chunk) => {
                let decoded = text.decode(&chunk);
                frames
                    .decode(&decoded)
                    .iter()
                    .filter_map(|frame| session.apply(frame))
                    .collect()
            }
            Step::Closed => {
                if text.has_incomplete() {
                    debug!("Stream closed inside a UTF-8 sequence");
                }
                if let Some(partial) = frames.finish() {
                    debug!(pending_len = partial.len(), "Discarding unterminated frame at end of stream");
                }
                session.finish().into_iter().collect()
            }
            Step::Failed(e) => {
                warn!(error = %e, "Stream body failed");
                session.fail(e.to_string()).into_iter().collect()
            }
            Step::IdleTimeout(limit) => {
                warn!(idle_seconds = limit.as_secs_f64(), "Stream idle timeout");
                session.fail(idle_message(limit)).into_iter().collect()
            }
            Step::Cancelled => {
                abort_session(&mut session);
                return;
            }
        };

        if !deliver(&mut session, pending, &events, &token).await {
            return;
        }

        if session.is_terminal() {
            debug!(phase = ?session.phase(), "Stream session ended");
            return;
        }
    }
}

/// Start one streaming request.
///
/// `request` is serialized as the JSON body posted to `target`. The
/// connection is opened when the returned stream is first polled; it is
/// never retried. The stream ends after exactly one terminal event
/// (`Complete` or `Error`), or silently after cancellation.
pub fn start_stream<T, R>(
    transport: Arc<T>,
    target: impl Into<String>,
    request: &R,
    options: StreamOptions,
) -> EventStream
where
    T: StreamTransport + ?Sized + 'static,
    R: Serialize + ?Sized,
{
    let handle = CancelHandle::new();
    let token = handle.token.clone();
    let driver_token = token.child_token();
    let driver_guard = driver_token.clone().drop_guard();
    let target = target.into();
    let body = serde_json::to_string(request);
    let session_id = Uuid::new_v4().to_string()[..8].to_string();

    let inner = async_stream::stream! {
        if token.is_cancelled() {
            debug!(session_id = %session_id, "Stream cancelled before it started");
            return;
        }

        let (sender, mut receiver) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(drive_session(
            transport,
            target,
            body,
            options,
            driver_token,
            sender,
            session_id,
        ));

        while let Some(event) = receiver.recv().await {
            if token.is_cancelled() {
                return;
            }
            yield event;
        }
    };

    EventStream {
        inner: Box::pin(inner),
        handle,
        _driver: driver_guard,
        finished: false,
    }
}

/// Drive `events` on a background task, delivering each to `observer`.
///
/// Returns the cancel handle and the task, which resolves to the observer
/// once the session ends. Events still in flight when `cancel()` is called
/// are dropped at the next check; no observer method runs for them.
pub fn spawn_stream<O>(mut events: EventStream, mut observer: O) -> (CancelHandle, JoinHandle<O>)
where
    O: StreamObserver + 'static,
{
    let handle = events.cancel_handle();
    let guard = handle.clone();

    let task = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if guard.is_cancelled() {
                break;
            }
            event.dispatch_to(&mut observer);
        }
        observer
    });

    (handle, task)
}

/// Start a request and deliver its events to `observer` on a background task
pub fn start_stream_with_observer<T, R, O>(
    transport: Arc<T>,
    target: impl Into<String>,
    request: &R,
    options: StreamOptions,
    observer: O,
) -> (CancelHandle, JoinHandle<O>)
where
    T: StreamTransport + ?Sized + 'static,
    R: Serialize + ?Sized,
    O: StreamObserver + 'static,
{
    spawn_stream(start_stream(transport, target, request, options), observer)
}
