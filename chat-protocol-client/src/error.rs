//! Client error types.

use chat_protocol_core::{ChatError, CoreError};
use chat_protocol_streaming::StreamError;
use std::collections::HashMap;
use thiserror::Error;

/// Errors returned by [`ChatProtocolClient`](crate::ChatProtocolClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx HTTP status.
    #[error("HTTP error: {status} - {body}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
        /// Response headers.
        headers: HashMap<String, String>,
        /// Error record parsed from the body, if it had one.
        error: Option<ChatError>,
    },

    /// A streamed line is not valid JSON or not a delta.
    #[error("Malformed record: {source}")]
    MalformedRecord {
        /// The offending line.
        line: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// In-band `{"error": {...}}` record.
    #[error("Chat error: {0}")]
    Protocol(ChatError),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout.
    #[error("Request timed out")]
    Timeout,

    /// Invalid response from the backend.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request was rejected before sending.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Credentials could not be applied.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClientError {
    /// Create a transport error.
    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body: body.into(),
            headers: HashMap::new(),
            error: None,
        }
    }

    /// Create a transport error from a failed response.
    ///
    /// An error-shaped JSON body is parsed into a [`ChatError`].
    pub fn from_failed_response(
        status: u16,
        body: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Self {
        let body = body.into();
        let error = serde_json::from_str(&body)
            .ok()
            .and_then(|value| ChatError::from_record(&value));
        Self::Transport {
            status,
            body,
            headers,
            error,
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// HTTP status, for transport errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The chat error carried by this error, in-band or in a failed response.
    #[must_use]
    pub fn chat_error(&self) -> Option<&ChatError> {
        match self {
            Self::Protocol(error) => Some(error),
            Self::Transport { error, .. } => error.as_ref(),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// The client never retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connection(_) => true,
            Self::Transport { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_body() || err.is_request() {
            Self::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            Self::transport(status.as_u16(), err.to_string())
        } else {
            Self::Other(err.into())
        }
    }
}

impl From<StreamError> for ClientError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::MalformedRecord { line, source } => Self::MalformedRecord { line, source },
            StreamError::Protocol(error) => Self::Protocol(error),
            StreamError::Connection(source) => match source.downcast::<reqwest::Error>() {
                Ok(err) => Self::from(*err),
                Err(other) => Self::Connection(other.to_string()),
            },
            StreamError::BufferOverflow { limit } => {
                Self::InvalidResponse(format!("streamed line exceeds {limit} bytes"))
            }
            StreamError::Serialization(err) => Self::Serialization(err),
        }
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidMessage(message) => Self::Validation(message),
            CoreError::InvalidResponse(message) => Self::InvalidResponse(message),
            CoreError::Serialization(err) => Self::Serialization(err),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::Connection("reset".into()).is_retryable());
        assert!(ClientError::transport(500, "Server error").is_retryable());
        assert!(ClientError::transport(503, "Unavailable").is_retryable());
        assert!(ClientError::transport(429, "Slow down").is_retryable());

        assert!(!ClientError::transport(400, "Bad request").is_retryable());
        assert!(!ClientError::transport(401, "Unauthorized").is_retryable());
        assert!(!ClientError::Protocol(ChatError::new("E1", "boom")).is_retryable());
        assert!(!ClientError::auth("no key").is_retryable());
    }

    #[test]
    fn test_failed_response_parses_error_body() {
        let err = ClientError::from_failed_response(
            400,
            r#"{"error":{"code":"bad_request","message":"no messages"}}"#,
            HashMap::new(),
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.chat_error(),
            Some(&ChatError::new("bad_request", "no messages"))
        );

        let err = ClientError::from_failed_response(502, "<html>bad gateway</html>", HashMap::new());
        assert_eq!(err.status(), Some(502));
        assert!(err.chat_error().is_none());
    }

    #[test]
    fn test_from_stream_error() {
        let err = ClientError::from(StreamError::Protocol(ChatError::new("X", "Y")));
        assert!(matches!(err, ClientError::Protocol(_)));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = ClientError::from(StreamError::connection(io));
        assert!(matches!(err, ClientError::Connection(_)));

        let err = ClientError::from(StreamError::BufferOverflow { limit: 8 });
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[test]
    fn test_from_core_error() {
        let err = ClientError::from(CoreError::invalid_message("empty"));
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::transport(404, "Not found");
        assert!(err.to_string().contains("404"));

        let err = ClientError::Protocol(ChatError::new("E1", "boom"));
        assert_eq!(err.to_string(), "Chat error: E1: boom");
    }
}
