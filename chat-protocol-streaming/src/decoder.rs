//! Incremental line decoding.
//!
//! [`LineDecoder`] turns byte chunks of arbitrary size into complete text
//! lines. It is synchronous and transport-agnostic; [`LineStream`] wraps it
//! around an async byte source.
//!
//! [`LineStream`]: crate::lines::LineStream

use crate::error::{StreamError, StreamResult};
use tracing::debug;

/// Default ceiling for a single pending line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 10 * 1024 * 1024;

/// What to do with bytes left over after the last line terminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingLine {
    /// Drop the unterminated fragment.
    #[default]
    Discard,
    /// Emit the unterminated fragment as a final line.
    Flush,
}

/// Splits a byte stream on `\n`, stripping an optional preceding `\r`.
///
/// Empty lines are skipped. Lines are decoded as UTF-8 only once complete,
/// so multi-byte characters split across chunks survive intact.
///
/// # Example
///
/// ```rust
/// use chat_protocol_streaming::LineDecoder;
///
/// let mut decoder = LineDecoder::new();
/// decoder.feed(b"{\"a\":1}\r\n{\"b\"");
/// assert_eq!(decoder.next_line().unwrap().as_deref(), Some("{\"a\":1}"));
/// assert_eq!(decoder.next_line().unwrap(), None);
///
/// decoder.feed(b":2}\n");
/// assert_eq!(decoder.next_line().unwrap().as_deref(), Some("{\"b\":2}"));
/// ```
#[derive(Debug, Clone)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    line_start: usize,
    cursor: usize,
    trailing_line: TrailingLine,
    max_line_length: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    /// Create a decoder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            line_start: 0,
            cursor: 0,
            trailing_line: TrailingLine::default(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Set the trailing-line policy.
    #[must_use]
    pub fn with_trailing_line(mut self, trailing_line: TrailingLine) -> Self {
        self.trailing_line = trailing_line;
        self
    }

    /// Set the maximum length of a single line in bytes.
    #[must_use]
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// The trailing-line policy.
    pub fn trailing_line(&self) -> TrailingLine {
        self.trailing_line
    }

    /// The maximum length of a single line in bytes.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Append a chunk. Empty chunks are accepted and change nothing.
    pub fn feed(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        if self.line_start > 0 {
            self.buffer.drain(..self.line_start);
            self.cursor -= self.line_start;
            self.line_start = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Pop the next complete, non-empty line.
    ///
    /// Returns `Ok(None)` when more input is needed. The length limit counts
    /// raw bytes, including a `\r` terminator.
    pub fn next_line(&mut self) -> StreamResult<Option<String>> {
        loop {
            let Some(offset) = self.buffer[self.cursor..].iter().position(|b| *b == b'\n') else {
                self.cursor = self.buffer.len();
                if self.buffered_len() > self.max_line_length {
                    return Err(StreamError::BufferOverflow {
                        limit: self.max_line_length,
                    });
                }
                return Ok(None);
            };

            let newline = self.cursor + offset;
            let start = self.line_start;
            self.line_start = newline + 1;
            self.cursor = self.line_start;

            if newline - start > self.max_line_length {
                return Err(StreamError::BufferOverflow {
                    limit: self.max_line_length,
                });
            }

            let mut end = newline;
            if end > start && self.buffer[end - 1] == b'\r' {
                end -= 1;
            }
            if end == start {
                continue;
            }

            return Ok(Some(String::from_utf8_lossy(&self.buffer[start..end]).into_owned()));
        }
    }

    /// Signal end of input and apply the trailing-line policy.
    ///
    /// Leaves the decoder empty.
    pub fn finish(&mut self) -> Option<String> {
        let mut fragment = self.buffer.split_off(self.line_start);
        self.clear();

        if fragment.is_empty() {
            return None;
        }

        match self.trailing_line {
            TrailingLine::Discard => {
                debug!(
                    bytes = fragment.len(),
                    "Discarding unterminated trailing line"
                );
                None
            }
            TrailingLine::Flush => {
                if fragment.last() == Some(&b'\r') {
                    fragment.pop();
                }
                if fragment.is_empty() {
                    return None;
                }
                Some(String::from_utf8_lossy(&fragment).into_owned())
            }
        }
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.line_start = 0;
        self.cursor = 0;
    }

    /// Number of bytes waiting for a terminator.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() - self.line_start
    }

    /// Whether no bytes are pending.
    pub fn is_empty(&self) -> bool {
        self.buffered_len() == 0
    }
}
