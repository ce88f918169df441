//! SSE (Server-Sent Events) streaming
//!
//! Turns the chat backend's `text/event-stream` responses into typed events.
//! Bytes flow through [`Utf8ChunkDecoder`], then [`FrameDecoder`], then a
//! [`StreamSession`], and come out of an [`EventStream`].

pub mod controller;
pub mod event;
pub mod frame;
pub mod session;
pub mod utf8;

pub use controller::{
    spawn_stream, start_stream, start_stream_with_observer, CancelHandle, EventStream,
    StreamOptions,
};
pub use event::{Completion, StreamEvent, StreamObserver};
pub use frame::{parse_frame, Frame, FrameDecoder, FRAME_DELIMITER};
pub use session::{SessionPhase, StreamSession};
pub use utf8::Utf8ChunkDecoder;
