//! Server-Sent Events (SSE) framing.
//!
//! [`FrameBuffer`] turns arbitrarily chunked response bytes into complete
//! blank-line-delimited frames, and [`classify`] splits one frame into its
//! `event:` and `data:` lines.

use thiserror::Error;

const EVENT_PREFIX: &str = "event:";
const DATA_PREFIX: &str = "data:";

/// Longest excerpt of an offending line quoted in a [`FrameError`].
const EXCERPT_CHARS: usize = 40;

/// A classified frame: event name plus the undecoded data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub name: String,
    pub data: String,
}

/// Why a frame could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("expected an 'event:' line, found {found:?}")]
    MissingEventLine { found: String },

    #[error("event '{name}' has no data line")]
    MissingDataLine { name: String },

    #[error("event '{name}' expected a 'data:' line, found {found:?}")]
    InvalidDataLine { name: String, found: String },
}

/// Incremental frame extractor.
///
/// Owns both the undecoded tail of a multi-byte UTF-8 sequence and the text
/// of a frame whose terminating blank line has not arrived yet.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    text: String,
    utf8_tail: Vec<u8>,
    /// Byte offset in `text` where the next delimiter search starts.
    scan_from: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of response bytes and return any complete frames.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk);
        self.drain_frames()
    }

    /// Feed a chunk of already-decoded text and return any complete frames.
    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.text.push_str(chunk);
        self.drain_frames()
    }

    /// Text buffered for a frame that is not terminated yet.
    pub fn remainder(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.utf8_tail.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.utf8_tail.clear();
        self.scan_from = 0;
    }

    /// Decode `chunk` onto `text`, holding back an incomplete trailing sequence.
    /// Invalid sequences become U+FFFD.
    fn decode(&mut self, chunk: &[u8]) {
        let joined;
        let mut input: &[u8] = if self.utf8_tail.is_empty() {
            chunk
        } else {
            self.utf8_tail.extend_from_slice(chunk);
            joined = std::mem::take(&mut self.utf8_tail);
            &joined
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    return;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    self.text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            self.utf8_tail = rest.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain_frames(&mut self) -> Vec<String> {
        let mut frames = Vec::new();

        while let Some((end, next)) = find_blank_line(self.text.as_bytes(), self.scan_from) {
            let frame = self.text[..end].to_string();
            self.text.drain(..next);
            self.scan_from = 0;

            // Keep-alive: nothing but whitespace between delimiters.
            if frame.trim().is_empty() {
                continue;
            }
            frames.push(frame);
        }

        // A delimiter is at most 4 bytes, so only its first 3 can already be buffered.
        self.scan_from = self.text.len().saturating_sub(3);
        frames
    }
}

/// Find the first blank line at or after `from`.
/// Returns `(frame_end, next_frame_start)` as byte offsets.
fn find_blank_line(bytes: &[u8], from: usize) -> Option<(usize, usize)> {
    let window = bytes.get(from..)?;
    let lf = window
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|i| (from + i, from + i + 2));
    let crlf = window
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (from + i, from + i + 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Split a complete frame into its event name and raw data payload.
///
/// The first line must start with `event:` and the second with `data:`.
/// Further lines (e.g. `id:`) are ignored.
pub fn classify(frame: &str) -> Result<SseEvent, FrameError> {
    let mut lines = frame.trim().lines();

    let event_line = lines.next().unwrap_or_default();
    let name = event_line
        .strip_prefix(EVENT_PREFIX)
        .ok_or_else(|| FrameError::MissingEventLine {
            found: excerpt(event_line),
        })?
        .trim()
        .to_string();

    let Some(data_line) = lines.next() else {
        return Err(FrameError::MissingDataLine { name });
    };
    let data = match data_line.strip_prefix(DATA_PREFIX) {
        Some(data) => data.trim().to_string(),
        None => {
            return Err(FrameError::InvalidDataLine {
                name,
                found: excerpt(data_line),
            });
        }
    };

    Ok(SseEvent { name, data })
}

fn excerpt(line: &str) -> String {
    line.chars().take(EXCERPT_CHARS).collect()
}
