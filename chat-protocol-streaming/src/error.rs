//! Streaming errors.

use chat_protocol_core::ChatError;
use thiserror::Error;

/// Errors that can occur while decoding a JSON-lines stream.
///
/// Every variant is fatal to the stream it was raised on.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A line is not valid JSON, or does not match the expected record type.
    #[error("Malformed record: {source}")]
    MalformedRecord {
        /// The offending line.
        line: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The backend sent an in-band `{"error": {...}}` record.
    #[error("Chat error: {0}")]
    Protocol(#[from] ChatError),

    /// The byte source failed while reading a chunk.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A single line grew past the decoder's limit.
    #[error("Line exceeds the {limit} byte buffer limit")]
    BufferOverflow {
        /// Configured maximum line length in bytes.
        limit: usize,
    },

    /// Serialization error while encoding records.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StreamError {
    /// Create a connection error from any transport error.
    pub fn connection<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Connection(err.into())
    }

    /// Create a malformed record error.
    pub fn malformed(line: impl Into<String>, source: serde_json::Error) -> Self {
        Self::MalformedRecord {
            line: line.into(),
            source,
        }
    }

    /// The in-band chat error, if this is one.
    #[must_use]
    pub fn chat_error(&self) -> Option<&ChatError> {
        match self {
            Self::Protocol(err) => Some(err),
            _ => None,
        }
    }

    /// Check if a caller could reasonably retry the whole request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
