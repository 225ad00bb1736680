//! Request bodies sent to a chat protocol endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::completion::{ChatCompletion, ChatCompletionDelta};
use super::message::{ChatFile, ChatMessage};
use crate::errors::{CoreError, Result};

/// Caller-supplied options that accompany the messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletionOptions {
    /// Opaque context forwarded to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Session token last received from the backend; `None` starts a new session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<Value>,
}

impl ChatCompletionOptions {
    /// Create empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the session state.
    #[must_use]
    pub fn with_session_state(mut self, session_state: Value) -> Self {
        self.session_state = Some(session_state);
        self
    }

    /// Options that continue the session of a previous completion.
    #[must_use]
    pub fn continuing(completion: &ChatCompletion) -> Self {
        Self {
            context: None,
            session_state: completion.session_state.clone(),
        }
    }

    /// Options that continue the session of a streamed completion.
    ///
    /// The last delta carrying a session state wins.
    #[must_use]
    pub fn continuing_stream<'a>(deltas: impl IntoIterator<Item = &'a ChatCompletionDelta>) -> Self {
        let session_state = deltas
            .into_iter()
            .filter_map(|delta| delta.session_state.clone())
            .last();
        Self {
            context: None,
            session_state,
        }
    }
}

/// The JSON body POSTed to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletionRequest {
    /// Conversation so far.
    pub messages: Vec<ChatMessage>,
    /// Whether the response should be streamed as JSON lines.
    pub stream: bool,
    /// Opaque context forwarded to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Session token echoed back to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<Value>,
}

impl ChatCompletionRequest {
    /// Build a request body.
    pub fn new(messages: Vec<ChatMessage>, options: ChatCompletionOptions, stream: bool) -> Self {
        Self {
            messages,
            stream,
            context: options.context,
            session_state: options.session_state,
        }
    }

    /// Check that the request can be sent.
    pub fn validate(&self) -> Result<()> {
        if self.messages.is_empty() {
            return Err(CoreError::invalid_message("at least one message is required"));
        }
        for (index, message) in self.messages.iter().enumerate() {
            message
                .validate()
                .map_err(|e| CoreError::invalid_message(format!("messages[{index}]: {e}")))?;
        }
        Ok(())
    }

    /// Whether any message carries file attachments.
    #[must_use]
    pub fn has_files(&self) -> bool {
        self.messages.iter().any(ChatMessage::has_files)
    }

    /// Multipart part names and attachments, in message order.
    #[must_use]
    pub fn file_parts(&self) -> Vec<(String, &ChatFile)> {
        self.messages
            .iter()
            .enumerate()
            .flat_map(|(index, message)| {
                message
                    .files
                    .iter()
                    .enumerate()
                    .map(move |(file_index, file)| {
                        (format!("messages[{index}].files[{file_index}]"), file)
                    })
            })
            .collect()
    }

    /// Serialize the JSON part of the body.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ChatMessageDelta, FinishReason};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = ChatCompletionRequest::new(
            vec![ChatMessage::user("Hello, world!")],
            ChatCompletionOptions::default(),
            false,
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "messages": [{"role": "user", "content": "Hello, world!"}],
                "stream": false
            })
        );
    }

    #[test]
    fn test_request_body_with_options() {
        let options = ChatCompletionOptions::new()
            .with_context(json!({"overrides": {"top": 3}}))
            .with_session_state(json!({"opaque": ["anything", 1]}));
        let request =
            ChatCompletionRequest::new(vec![ChatMessage::user("Hi")], options, true);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["stream"], json!(true));
        assert_eq!(body["context"], json!({"overrides": {"top": 3}}));
        assert_eq!(body["sessionState"], json!({"opaque": ["anything", 1]}));
    }

    #[test]
    fn test_validate() {
        let empty = ChatCompletionRequest::new(vec![], ChatCompletionOptions::default(), false);
        assert!(matches!(empty.validate(), Err(CoreError::InvalidMessage(_))));

        let blank = ChatCompletionRequest::new(
            vec![ChatMessage::user("ok"), ChatMessage::user("")],
            ChatCompletionOptions::default(),
            false,
        );
        let err = blank.validate().unwrap_err();
        assert!(err.to_string().contains("messages[1]"));
    }

    #[test]
    fn test_file_parts() {
        let request = ChatCompletionRequest::new(
            vec![
                ChatMessage::system("Look closely."),
                ChatMessage::user("What is this?")
                    .with_file(ChatFile::new("image/png", vec![1, 2, 3]))
                    .with_file(ChatFile::new("image/jpeg", vec![4]).with_filename("b.jpg")),
            ],
            ChatCompletionOptions::default(),
            false,
        );

        assert!(request.has_files());
        let parts = request.file_parts();
        let names: Vec<&str> = parts.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["messages[1].files[0]", "messages[1].files[1]"]);
        assert_eq!(parts[1].1.filename.as_deref(), Some("b.jpg"));
    }

    #[test]
    fn test_continuing_session() {
        let completion = ChatCompletion::new(ChatMessage::assistant("hi"))
            .with_session_state(json!("session-1"))
            .with_finish_reason(FinishReason::Stopped);
        let options = ChatCompletionOptions::continuing(&completion);
        assert_eq!(options.session_state, Some(json!("session-1")));

        let deltas = vec![
            ChatCompletionDelta::new(ChatMessageDelta::content("a"))
                .with_session_state(json!("s-1")),
            ChatCompletionDelta::new(ChatMessageDelta::content("b"))
                .with_session_state(json!("s-2")),
            ChatCompletionDelta::new(ChatMessageDelta::content("c")),
        ];
        let options = ChatCompletionOptions::continuing_stream(&deltas);
        assert_eq!(options.session_state, Some(json!("s-2")));
    }
}
