//! # chat-protocol-streaming
//!
//! JSON-lines (NDJSON) streaming for the AI Chat Protocol.
//!
//! This crate turns a chunked byte stream into typed records. It knows
//! nothing about HTTP: any `Stream<Item = Result<B, E>>` where `B: AsRef<[u8]>`
//! works, including `reqwest::Response::bytes_stream()`.
//!
//! ## Core Concepts
//!
//! - **[`LineDecoder`]**: Split byte chunks into complete lines
//! - **[`LineStream`]**: Async line stream over a byte source
//! - **[`JsonLinesStream`]**: Typed records, stopping at the first error record
//! - **[`JsonLinesEncoder`]**: The producer side, one JSON document per line
//! - **[`CompletionAccumulator`]**: Fold streamed deltas into a full completion
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use chat_protocol_core::ChatCompletionDelta;
//! use chat_protocol_streaming::{json_lines, CompletionAccumulator};
//! use futures::stream;
//!
//! # tokio_test::block_on(async {
//! let chunks = vec![
//!     Ok::<_, std::io::Error>(Bytes::from_static(b"{\"delta\":{\"content\":\"Hel\"}}\n{\"del")),
//!     Ok(Bytes::from_static(b"ta\":{\"content\":\"lo\"},\"finishReason\":\"stop\"}\n")),
//! ];
//!
//! let deltas = json_lines::<ChatCompletionDelta, _>(stream::iter(chunks));
//! let completion = CompletionAccumulator::collect(deltas).await.unwrap();
//! assert_eq!(completion.content(), "Hello");
//! # });
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod accumulator;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod lines;
pub mod records;

// Re-exports
pub use accumulator::CompletionAccumulator;
pub use decoder::{LineDecoder, TrailingLine, DEFAULT_MAX_LINE_LENGTH};
pub use encoder::{JsonLinesEncoder, LineTerminator};
pub use error::{StreamError, StreamResult};
pub use lines::LineStream;
pub use records::{json_lines, parse_line, JsonLinesStream, ParsedLine, StreamState, DONE_SENTINEL};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::accumulator::CompletionAccumulator;
    pub use crate::decoder::{LineDecoder, TrailingLine};
    pub use crate::encoder::JsonLinesEncoder;
    pub use crate::error::{StreamError, StreamResult};
    pub use crate::records::{json_lines, JsonLinesStream, StreamState};
}
