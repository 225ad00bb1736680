//! Error types for the chat protocol.
//!
//! [`ChatError`] is the in-band error record a backend can send either as the
//! whole response body or as a line in a streamed response. [`CoreError`]
//! covers failures of the data model itself (validation, normalization).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Code used when an `error` property is present but not shaped as `{code, message}`.
pub const UNKNOWN_ERROR_CODE: &str = "unknown";

/// An in-band protocol error: `{"error": {"code": "...", "message": "..."}}`.
///
/// Its presence in a decoded record is terminal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ChatError {
    /// Short machine-readable identifier.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl ChatError {
    /// Create a new chat error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Extract the error carried by a decoded record, if any.
    ///
    /// Any JSON object with an `error` property is treated as an error record.
    /// A well-formed `{code, message}` payload is returned as-is; anything else
    /// is reported under [`UNKNOWN_ERROR_CODE`] with the raw payload as message.
    #[must_use]
    pub fn from_record(record: &Value) -> Option<Self> {
        let payload = record.as_object()?.get("error")?;

        if let Some(fields) = payload.as_object() {
            let code = fields.get("code").map(scalar_to_string);
            let message = fields.get("message").map(scalar_to_string);
            if let (Some(code), Some(message)) = (code, message) {
                return Some(Self { code, message });
            }
        }

        let message = match payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Some(Self::new(UNKNOWN_ERROR_CODE, message))
    }

    /// Wrap this error in the `{"error": {...}}` envelope used on the wire.
    #[must_use]
    pub fn to_record(&self) -> Value {
        serde_json::json!({ "error": self })
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Errors raised by the protocol data model.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A message cannot be sent as-is.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// A response document does not match any known wire shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create an invalid message error.
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage(message.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::new("E1", "boom");
        assert_eq!(err.to_string(), "E1: boom");
    }

    #[test]
    fn test_from_record_well_formed() {
        let record = json!({"error": {"code": "X", "message": "Y"}});
        assert_eq!(ChatError::from_record(&record), Some(ChatError::new("X", "Y")));
    }

    #[test]
    fn test_from_record_ignores_plain_records() {
        assert_eq!(ChatError::from_record(&json!({"delta": {"content": "hi"}})), None);
        assert_eq!(ChatError::from_record(&json!([1, 2, 3])), None);
        assert_eq!(ChatError::from_record(&json!("error")), None);
    }

    #[test]
    fn test_from_record_malformed_payload() {
        let err = ChatError::from_record(&json!({"error": "rate limited"})).unwrap();
        assert_eq!(err.code, UNKNOWN_ERROR_CODE);
        assert_eq!(err.message, "rate limited");

        let err = ChatError::from_record(&json!({"error": {"code": "only-code"}})).unwrap();
        assert_eq!(err.code, UNKNOWN_ERROR_CODE);
        assert_eq!(err.message, r#"{"code":"only-code"}"#);
    }

    #[test]
    fn test_from_record_numeric_code() {
        let err = ChatError::from_record(&json!({"error": {"code": 429, "message": "slow down"}}))
            .unwrap();
        assert_eq!(err.code, "429");
        assert_eq!(err.message, "slow down");
    }

    #[test]
    fn test_to_record_roundtrips() {
        let err = ChatError::new("content_filter", "Blocked");
        assert_eq!(ChatError::from_record(&err.to_record()), Some(err));
    }

    #[test]
    fn test_core_error_display() {
        let err = CoreError::invalid_message("content must not be empty");
        assert!(err.to_string().contains("content must not be empty"));
    }
}
