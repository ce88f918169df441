//! Incremental UTF-8 decoding for transport chunks
//!
//! Network chunks do not respect character boundaries: a multi-byte sequence
//! can start at the end of one chunk and finish at the start of the next.
//! Decoding each chunk independently would replace both halves with U+FFFD.

/// Decoder that carries an incomplete trailing sequence between chunks.
///
/// # Example
/// ```
/// use assistant_stream::streaming::Utf8ChunkDecoder;
///
/// let mut decoder = Utf8ChunkDecoder::new();
/// let euro = "€".as_bytes();
///
/// assert_eq!(decoder.decode(&euro[..1]), "");
/// assert_eq!(decoder.decode(&euro[1..]), "€");
/// ```
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    /// Bytes of a sequence that is not yet complete (at most 3)
    incomplete: Vec<u8>,
}

impl Utf8ChunkDecoder {
    /// Create a new decoder with nothing carried over
    pub fn new() -> Self {
        Self {
            incomplete: Vec::new(),
        }
    }

    /// Decode a chunk, returning every complete character it finishes.
    ///
    /// Invalid sequences are replaced with U+FFFD. An incomplete sequence at
    /// the end of the chunk is held back until the next call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        if bytes.is_empty() {
            return String::new();
        }

        let mut input = std::mem::take(&mut self.incomplete);
        input.extend_from_slice(bytes);

        let mut output = String::with_capacity(input.len());
        let mut rest = input.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    output.push_str(text);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    output.push_str(&String::from_utf8_lossy(valid));

                    match e.error_len() {
                        Some(len) => {
                            output.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.incomplete = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        output
    }

    /// Whether a partial sequence is waiting for more bytes
    pub fn has_incomplete(&self) -> bool {
        !self.incomplete.is_empty()
    }

    /// Flush whatever is left at end of stream.
    ///
    /// A truncated sequence can never complete, so it decodes as U+FFFD.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.incomplete);
        String::from_utf8_lossy(&rest).into_owned()
    }
}
