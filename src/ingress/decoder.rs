use crate::error::FrameParseError;
use crate::kernel::segment::{parse_payload, StreamEvent};

/// Prefix of every frame that carries a payload.
pub const EVENT_TAG: &str = "data:";

/// Frames end at a blank line.
pub const FRAME_DELIMITER: &str = "\n\n";

const REPLACEMENT: char = '\u{FFFD}';

/// UTF-8 decoder that holds back an incomplete multi-byte sequence at the
/// end of a chunk until the next chunk completes it. Invalid sequences
/// decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        out.push_str(valid);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &tail[len..];
                        }
                        None => {
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// End of input. A held-back partial sequence can no longer complete.
    pub fn finish(&mut self) -> Option<char> {
        if self.pending.is_empty() {
            None
        } else {
            self.pending.clear();
            Some(REPLACEMENT)
        }
    }
}

/// Chunk-boundary independent frame splitter.
///
/// For a fixed byte sequence, the events returned across all `push` calls
/// are the same however the bytes are chunked.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    text: Utf8StreamDecoder,
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk, returning one result per frame it completed.
    /// Frames without the event tag (SSE comments, blank frames) yield nothing.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<StreamEvent, FrameParseError>> {
        let decoded = self.text.decode(chunk);
        self.buffer.push_str(&decoded);
        // CRLF line endings. A `\r` left at the end of one chunk pairs with
        // the `\n` that opens the next.
        if self.buffer.contains("\r\n") {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut events = Vec::new();
        while let Some(at) = self.buffer.find(FRAME_DELIMITER) {
            let frame: String = self.buffer.drain(..at + FRAME_DELIMITER.len()).collect();
            if let Some(result) = parse_frame(&frame[..at]) {
                events.push(result);
            }
        }
        events
    }

    /// End of stream. Returns the unterminated remainder, if any; it is never
    /// parsed.
    pub fn finish(&mut self) -> Option<String> {
        if let Some(c) = self.text.finish() {
            self.buffer.push(c);
        }
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Bytes of text carried over to the next chunk.
    pub fn carried(&self) -> usize {
        self.buffer.len()
    }
}

fn parse_frame(frame: &str) -> Option<Result<StreamEvent, FrameParseError>> {
    let frame = frame.trim_start_matches(['\r', '\n']);
    let payload = frame.strip_prefix(EVENT_TAG)?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    Some(parse_payload(payload.trim_end_matches('\r')))
}
