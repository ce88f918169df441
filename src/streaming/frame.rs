//! Server-Sent Event frame decoding
//!
//! The backend writes each event as a block of `event:` and `data:` lines
//! terminated by a blank line:
//!
//! ```text
//! event: token
//! data: Hello
//!
//! ```
//!
//! Text arrives in arbitrary chunks, so the decoder keeps the unterminated
//! tail of the buffer until the next chunk completes it.

/// Delimiter between frames on the wire
pub const FRAME_DELIMITER: &str = "\n\n";

/// One decoded event: its type and the newline-joined data lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event_type: String,
    pub data: String,
}

impl Frame {
    /// Create a frame from its parts
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
        }
    }
}

/// Parse the lines of one complete frame (without its terminating blank line).
///
/// - `event:` lines set the type, trimmed. When several appear the last one
///   wins, as permissive browser parsers do.
/// - `data:` lines lose at most one leading space and are joined with `\n`.
/// - Any other line is ignored.
///
/// Returns `None` when no non-empty event type was given.
pub fn parse_frame(segment: &str) -> Option<Frame> {
    let mut event_type: Option<&str> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in segment.split('\n') {
        if let Some(rest) = line.strip_prefix("event:") {
            event_type = Some(rest.trim());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    match event_type {
        Some(event_type) if !event_type.is_empty() => {
            Some(Frame::new(event_type, data_lines.join("\n")))
        }
        _ => None,
    }
}

/// Incremental frame decoder.
///
/// Feeding the same text in any chunking yields the same frames in the same
/// order.
///
/// # Example
/// ```
/// use assistant_stream::streaming::{Frame, FrameDecoder};
///
/// let mut decoder = FrameDecoder::new();
///
/// assert!(decoder.decode("event: token\ndata: Hel").is_empty());
/// assert_eq!(
///     decoder.decode("lo\n\n"),
///     vec![Frame::new("token", "Hello")]
/// );
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Text received after the last frame delimiter
    buffer: String,
}

impl FrameDecoder {
    /// Create a decoder with an empty buffer
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Append a chunk and return every frame it completes, in wire order.
    pub fn decode(&mut self, chunk: &str) -> Vec<Frame> {
        if chunk.is_empty() {
            return Vec::new();
        }

        // A delimiter can straddle the old tail and the new chunk
        let search_from = if self.buffer.ends_with('\n') {
            self.buffer.len() - 1
        } else {
            self.buffer.len()
        };
        self.buffer.push_str(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        let mut cursor = search_from;

        while let Some(offset) = self.buffer[cursor..].find(FRAME_DELIMITER) {
            let end = cursor + offset;
            if let Some(frame) = parse_frame(&self.buffer[consumed..end]) {
                frames.push(frame);
            }
            consumed = end + FRAME_DELIMITER.len();
            cursor = consumed;
        }

        if consumed > 0 {
            self.buffer.drain(..consumed);
        }

        frames
    }

    /// Text waiting for its terminating blank line
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Whether an unterminated frame is buffered
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// End of stream: the unterminated tail is discarded, never emitted.
    ///
    /// Returns the discarded text so the caller can log it.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }
}
