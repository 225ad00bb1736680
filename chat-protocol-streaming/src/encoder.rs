//! JSON-lines encoding.

use crate::error::StreamResult;
use bytes::{BufMut, Bytes, BytesMut};
use chat_protocol_core::ChatError;
use serde::Serialize;

/// Line terminator written after each record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineTerminator {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineTerminator {
    /// The terminator bytes.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::CrLf => b"\r\n",
        }
    }
}

/// Serializes records as one compact JSON document per line.
///
/// # Example
///
/// ```rust
/// use chat_protocol_streaming::JsonLinesEncoder;
///
/// let encoder = JsonLinesEncoder::new();
/// let body = encoder.encode_all(&[serde_json::json!({"a": 1}), serde_json::json!({"a": 2})]).unwrap();
/// assert_eq!(&body[..], b"{\"a\":1}\n{\"a\":2}\n");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesEncoder {
    terminator: LineTerminator,
}

impl JsonLinesEncoder {
    /// Create an encoder that terminates lines with `\n`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line terminator.
    #[must_use]
    pub fn with_terminator(mut self, terminator: LineTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Encode a single record as one line.
    pub fn encode<T: Serialize>(&self, record: &T) -> StreamResult<Bytes> {
        let mut buf = BytesMut::new();
        self.encode_into(record, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Encode every record into one body.
    pub fn encode_all<'a, T, I>(&self, records: I) -> StreamResult<Bytes>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut buf = BytesMut::new();
        for record in records {
            self.encode_into(record, &mut buf)?;
        }
        Ok(buf.freeze())
    }

    /// Encode an in-band error record.
    pub fn encode_error(&self, error: &ChatError) -> StreamResult<Bytes> {
        self.encode(&error.to_record())
    }

    fn encode_into<T: Serialize>(&self, record: &T, buf: &mut BytesMut) -> StreamResult<()> {
        let json = serde_json::to_vec(record)?;
        buf.reserve(json.len() + 2);
        buf.put_slice(&json);
        buf.put_slice(self.terminator.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::json_lines;
    use chat_protocol_core::{ChatCompletionDelta, ChatMessageDelta, ChatRole, FinishReason};
    use futures::{stream, StreamExt};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_encode_crlf() {
        let encoder = JsonLinesEncoder::new().with_terminator(LineTerminator::CrLf);
        let line = encoder.encode(&json!({"x": "y"})).unwrap();
        assert_eq!(&line[..], b"{\"x\":\"y\"}\r\n");
    }

    #[test]
    fn test_encode_error_record() {
        let line = JsonLinesEncoder::new()
            .encode_error(&ChatError::new("E1", "boom"))
            .unwrap();
        assert_eq!(&line[..], b"{\"error\":{\"code\":\"E1\",\"message\":\"boom\"}}\n");
    }

    #[tokio::test]
    async fn test_encoded_body_decodes() {
        let deltas = vec![
            ChatCompletionDelta::new(ChatMessageDelta::content("Hi").with_role(ChatRole::Assistant)),
            ChatCompletionDelta::new(ChatMessageDelta::content(" there"))
                .with_session_state(json!({"turn": 1})),
            ChatCompletionDelta::new(ChatMessageDelta::default())
                .with_finish_reason(FinishReason::Stopped),
        ];
        let body = JsonLinesEncoder::new()
            .with_terminator(LineTerminator::CrLf)
            .encode_all(&deltas)
            .unwrap();

        let chunks: Vec<Result<Bytes, std::io::Error>> =
            body.chunks(5).map(|c| Ok(Bytes::copy_from_slice(c))).collect();
        let decoded: Vec<ChatCompletionDelta> = json_lines::<ChatCompletionDelta, _>(stream::iter(chunks))
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(decoded, deltas);
    }
}
