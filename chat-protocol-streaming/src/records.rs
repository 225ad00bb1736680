//! Typed JSON-lines records.
//!
//! Each decoded line holds one JSON document. An object with an `error`
//! property is an in-band failure and ends the stream. Lines framed as
//! Server-Sent Events (`data: {...}`) are accepted too, with `data: [DONE]`
//! treated as a clean end of stream.

use crate::decoder::LineDecoder;
use crate::error::{StreamError, StreamResult};
use crate::lines::LineStream;
use chat_protocol_core::ChatError;
use futures::stream::FusedStream;
use futures::Stream;
use pin_project_lite::pin_project;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error as StdError;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, trace, warn};

/// End-of-stream sentinel used by SSE-framed backends.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Classification of a single decoded line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine<T> {
    /// A record to hand to the caller.
    Record(T),
    /// Nothing to yield (empty line, empty `data:` payload or SSE comment).
    Skip,
    /// End-of-stream sentinel.
    Done,
}

/// Parse one line into a record.
///
/// # Errors
///
/// Returns [`StreamError::Protocol`] for an error record and
/// [`StreamError::MalformedRecord`] for invalid JSON or a shape mismatch.
pub fn parse_line<T: DeserializeOwned>(line: &str) -> StreamResult<ParsedLine<T>> {
    if line.is_empty() || line.starts_with(':') {
        return Ok(ParsedLine::Skip);
    }

    // Only SSE-framed payloads may be empty or carry the sentinel; a bare
    // line is always a JSON document.
    let payload = match line.trim_start().strip_prefix("data:") {
        Some(data) => {
            let data = data.trim();
            if data.is_empty() {
                return Ok(ParsedLine::Skip);
            }
            if data == DONE_SENTINEL {
                return Ok(ParsedLine::Done);
            }
            data
        }
        None => line,
    };

    let value: Value =
        serde_json::from_str(payload).map_err(|e| StreamError::malformed(line, e))?;

    if let Some(error) = ChatError::from_record(&value) {
        return Err(StreamError::Protocol(error));
    }

    serde_json::from_value(value)
        .map(ParsedLine::Record)
        .map_err(|e| StreamError::malformed(line, e))
}

/// Lifecycle of a record stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Records may still arrive.
    Streaming,
    /// The source ended or sent the end sentinel.
    Completed,
    /// A record, protocol or connection error ended the stream.
    Errored,
    /// The caller cancelled the stream.
    Cancelled,
}

impl StreamState {
    /// Whether the stream has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Streaming)
    }
}

pin_project! {
    /// Stream of typed records decoded from a JSON-lines byte stream.
    ///
    /// The first error is yielded once and then the stream ends; no further
    /// lines are read.
    pub struct JsonLinesStream<S, T> {
        #[pin]
        lines: LineStream<S>,
        cancel: Option<Pin<Box<WaitForCancellationFutureOwned>>>,
        state: StreamState,
        _record: PhantomData<fn() -> T>,
    }
}

impl<S, T> JsonLinesStream<S, T> {
    /// Create a record stream with a default decoder.
    pub fn new(inner: S) -> Self {
        Self::with_decoder(inner, LineDecoder::new())
    }

    /// Create a record stream with a configured decoder.
    pub fn with_decoder(inner: S, decoder: LineDecoder) -> Self {
        Self {
            lines: LineStream::with_decoder(inner, decoder),
            cancel: None,
            state: StreamState::Streaming,
            _record: PhantomData,
        }
    }

    /// End the stream when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(Box::pin(token.cancelled_owned()));
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }
}

impl<S, B, E, T> Stream for JsonLinesStream<S, T>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Box<dyn StdError + Send + Sync>>,
    T: DeserializeOwned,
{
    type Item = StreamResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if this.state.is_terminal() {
            return Poll::Ready(None);
        }

        if let Some(cancel) = this.cancel.as_mut() {
            if cancel.as_mut().poll(cx).is_ready() {
                debug!("JSON-lines stream cancelled");
                *this.cancel = None;
                *this.state = StreamState::Cancelled;
                this.lines.as_mut().close();
                return Poll::Ready(None);
            }
        }

        loop {
            let line = match this.lines.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(line))) => line,
                Poll::Ready(Some(Err(error))) => {
                    warn!(error = %error, "JSON-lines stream failed");
                    *this.cancel = None;
                    *this.state = StreamState::Errored;
                    return Poll::Ready(Some(Err(error)));
                }
                Poll::Ready(None) => {
                    *this.cancel = None;
                    *this.state = StreamState::Completed;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            };

            trace!(line = %line, "Decoded line");

            match parse_line::<T>(&line) {
                Ok(ParsedLine::Record(record)) => return Poll::Ready(Some(Ok(record))),
                Ok(ParsedLine::Skip) => continue,
                Ok(ParsedLine::Done) => {
                    debug!("Received end-of-stream sentinel");
                    *this.cancel = None;
                    *this.state = StreamState::Completed;
                    this.lines.as_mut().close();
                    return Poll::Ready(None);
                }
                Err(error) => {
                    warn!(error = %error, "JSON-lines stream failed");
                    *this.cancel = None;
                    *this.state = StreamState::Errored;
                    this.lines.as_mut().close();
                    return Poll::Ready(Some(Err(error)));
                }
            }
        }
    }
}

impl<S, B, E, T> FusedStream for JsonLinesStream<S, T>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Box<dyn StdError + Send + Sync>>,
    T: DeserializeOwned,
{
    fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Decode a byte stream into typed records with default settings.
pub fn json_lines<T, S>(inner: S) -> JsonLinesStream<S, T> {
    JsonLinesStream::new(inner)
}
