//! Completion results and streaming deltas.
//!
//! Backends answer in one of two wire shapes:
//!
//! - flat: `{"message": {...}, "finishReason": "stop", "sessionState": ..., "context": ...}`
//! - legacy: `{"choices": [{"index": 0, "message": {...}, "finish_reason": "stop", ...}]}`
//!
//! Both decode into the same [`ChatCompletion`] (and likewise for
//! [`ChatCompletionDelta`] with `delta` in place of `message`). Only the
//! choice with `index` 0 is read; a legacy delta that carries only other
//! choices decodes as an empty delta. Serialization always produces the flat
//! shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::message::{ChatMessage, ChatMessageDelta};
use crate::errors::CoreError;

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinishReason {
    /// Natural end of the response (`"stop"`).
    Stopped,
    /// Token limit reached (`"length"`).
    TokenLimitReached,
    /// Any other reason reported by the backend.
    Other(String),
}

impl FinishReason {
    /// Wire representation of the reason.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stopped => "stop",
            Self::TokenLimitReached => "length",
            Self::Other(reason) => reason,
        }
    }

    /// Check if the response was cut off by the token limit.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::TokenLimitReached)
    }
}

impl From<String> for FinishReason {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("stop") {
            Self::Stopped
        } else if value.eq_ignore_ascii_case("length") {
            Self::TokenLimitReached
        } else {
            Self::Other(value)
        }
    }
}

impl From<FinishReason> for String {
    fn from(reason: FinishReason) -> Self {
        match reason {
            FinishReason::Other(reason) => reason,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete, non-streamed chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CompletionWire")]
pub struct ChatCompletion {
    /// The generated message.
    pub message: ChatMessage,
    /// Opaque token to echo back on the next request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_state: Option<Value>,
    /// Opaque backend-defined context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Why generation stopped. Some backends omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl ChatCompletion {
    /// Create a completion for a message.
    pub fn new(message: ChatMessage) -> Self {
        Self {
            message,
            session_state: None,
            context: None,
            finish_reason: None,
        }
    }

    /// Set the session state.
    #[must_use]
    pub fn with_session_state(mut self, session_state: Value) -> Self {
        self.session_state = Some(session_state);
        self
    }

    /// Set the context.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the finish reason.
    #[must_use]
    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    /// The generated text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// One unit of a streamed completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DeltaWire")]
pub struct ChatCompletionDelta {
    /// Partial message.
    pub delta: ChatMessageDelta,
    /// Opaque token to echo back on the next request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_state: Option<Value>,
    /// Opaque backend-defined context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Set on the delta that closes the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl ChatCompletionDelta {
    /// Create a delta wrapping a partial message.
    pub fn new(delta: ChatMessageDelta) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }

    /// Set the session state.
    #[must_use]
    pub fn with_session_state(mut self, session_state: Value) -> Self {
        self.session_state = Some(session_state);
        self
    }

    /// Set the context.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the finish reason.
    #[must_use]
    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    /// The content fragment, if any.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.delta.content.as_deref()
    }

    /// Whether this delta closes the response.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// Union of the flat and legacy completion shapes.
#[derive(Deserialize)]
struct CompletionWire {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default, rename = "sessionState", alias = "session_state")]
    session_state: Option<Value>,
    #[serde(default)]
    context: Option<Value>,
    #[serde(default, rename = "finishReason", alias = "finish_reason")]
    finish_reason: Option<FinishReason>,
    #[serde(default)]
    choices: Option<Vec<LegacyChoice>>,
}

/// Union of the flat and legacy delta shapes.
#[derive(Deserialize)]
struct DeltaWire {
    #[serde(default)]
    delta: Option<ChatMessageDelta>,
    #[serde(default, rename = "sessionState", alias = "session_state")]
    session_state: Option<Value>,
    #[serde(default)]
    context: Option<Value>,
    #[serde(default, rename = "finishReason", alias = "finish_reason")]
    finish_reason: Option<FinishReason>,
    #[serde(default)]
    choices: Option<Vec<LegacyChoice>>,
}

/// An entry of the legacy `choices` array.
#[derive(Deserialize)]
struct LegacyChoice {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    delta: Option<ChatMessageDelta>,
    #[serde(default, rename = "finish_reason", alias = "finishReason")]
    finish_reason: Option<FinishReason>,
    #[serde(default, rename = "session_state", alias = "sessionState")]
    session_state: Option<Value>,
    #[serde(default)]
    context: Option<Value>,
}

/// The primary choice (`index` 0). Other choices are alternative
/// generations and are not merged into a single response.
fn primary_choice(choices: Vec<LegacyChoice>) -> Option<LegacyChoice> {
    #[cfg(feature = "tracing-integration")]
    if choices.iter().any(|choice| choice.index != 0) {
        tracing::debug!(
            choices = choices.len(),
            "legacy payload carries non-primary choices, ignoring them"
        );
    }
    choices.into_iter().find(|choice| choice.index == 0)
}

impl TryFrom<CompletionWire> for ChatCompletion {
    type Error = CoreError;

    fn try_from(wire: CompletionWire) -> Result<Self, Self::Error> {
        if let Some(message) = wire.message {
            return Ok(Self {
                message,
                session_state: wire.session_state,
                context: wire.context,
                finish_reason: wire.finish_reason,
            });
        }

        let choice = wire
            .choices
            .and_then(primary_choice)
            .ok_or_else(|| CoreError::invalid_response("expected `message` or `choices[0]`"))?;
        let message = choice
            .message
            .ok_or_else(|| CoreError::invalid_response("missing `message` in `choices` element"))?;

        Ok(Self {
            message,
            session_state: choice.session_state.or(wire.session_state),
            context: choice.context.or(wire.context),
            finish_reason: choice.finish_reason.or(wire.finish_reason),
        })
    }
}

impl From<DeltaWire> for ChatCompletionDelta {
    fn from(wire: DeltaWire) -> Self {
        if wire.delta.is_none() {
            if let Some(choice) = wire.choices.and_then(primary_choice) {
                return Self {
                    delta: choice.delta.unwrap_or_default(),
                    session_state: choice.session_state.or(wire.session_state),
                    context: choice.context.or(wire.context),
                    finish_reason: choice.finish_reason.or(wire.finish_reason),
                };
            }
        }

        Self {
            delta: wire.delta.unwrap_or_default(),
            session_state: wire.session_state,
            context: wire.context,
            finish_reason: wire.finish_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ChatRole;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("stop", FinishReason::Stopped)]
    #[case("STOP", FinishReason::Stopped)]
    #[case("length", FinishReason::TokenLimitReached)]
    #[case("content_filter", FinishReason::Other("content_filter".into()))]
    fn test_finish_reason_from_wire(#[case] wire: &str, #[case] expected: FinishReason) {
        assert_eq!(serde_json::from_value::<FinishReason>(json!(wire)).unwrap(), expected);
    }

    #[test]
    fn test_finish_reason_to_wire() {
        assert_eq!(serde_json::to_value(FinishReason::Stopped).unwrap(), json!("stop"));
        assert_eq!(
            serde_json::to_value(FinishReason::TokenLimitReached).unwrap(),
            json!("length")
        );
        assert!(FinishReason::TokenLimitReached.is_truncated());
        assert!(!FinishReason::Stopped.is_truncated());
    }

    #[test]
    fn test_flat_completion() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "message": {"role": "assistant", "content": "Hello, world!"},
            "finishReason": "stop",
            "sessionState": {"id": 42},
            "context": {"payload": [1]}
        }))
        .unwrap();

        assert_eq!(completion.content(), "Hello, world!");
        assert_eq!(completion.message.role, ChatRole::Assistant);
        assert_eq!(completion.finish_reason, Some(FinishReason::Stopped));
        assert_eq!(completion.session_state, Some(json!({"id": 42})));
        assert_eq!(completion.context, Some(json!({"payload": [1]})));
    }

    #[test]
    fn test_completion_without_finish_reason() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "message": {"role": "assistant", "content": "Hi"}
        }))
        .unwrap();
        assert_eq!(completion.finish_reason, None);
        assert_eq!(completion.session_state, None);
    }

    #[test]
    fn test_legacy_completion() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [
                {
                    "index": 1,
                    "message": {"role": "assistant", "content": "second"},
                    "finish_reason": "length"
                },
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "first"},
                    "finish_reason": "stop",
                    "session_state": "s-1",
                    "context": {"k": "v"}
                }
            ]
        }))
        .unwrap();

        assert_eq!(completion.content(), "first");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stopped));
        assert_eq!(completion.session_state, Some(json!("s-1")));
        assert_eq!(completion.context, Some(json!({"k": "v"})));
    }

    #[test]
    fn test_completion_missing_message_fails() {
        assert!(serde_json::from_value::<ChatCompletion>(json!({"finishReason": "stop"})).is_err());
        assert!(serde_json::from_value::<ChatCompletion>(json!({"choices": []})).is_err());
        assert!(
            serde_json::from_value::<ChatCompletion>(json!({"choices": [{"index": 0}]})).is_err()
        );
    }

    #[test]
    fn test_completion_serializes_flat_shape() {
        let completion = ChatCompletion::new(ChatMessage::assistant("ok"))
            .with_finish_reason(FinishReason::TokenLimitReached)
            .with_session_state(json!("token"));

        assert_eq!(
            serde_json::to_value(&completion).unwrap(),
            json!({
                "message": {"role": "assistant", "content": "ok"},
                "sessionState": "token",
                "finishReason": "length"
            })
        );
    }

    #[test]
    fn test_flat_delta() {
        let delta: ChatCompletionDelta = serde_json::from_value(json!({
            "delta": {"role": "assistant", "content": "Hel"},
            "sessionState": "abc"
        }))
        .unwrap();

        assert_eq!(delta.content(), Some("Hel"));
        assert_eq!(delta.delta.role, Some(ChatRole::Assistant));
        assert_eq!(delta.session_state, Some(json!("abc")));
        assert!(!delta.is_final());
    }

    #[test]
    fn test_legacy_delta() {
        let delta: ChatCompletionDelta = serde_json::from_value(json!({
            "choices": [{"index": 0, "delta": {"content": "lo"}, "finish_reason": "stop"}]
        }))
        .unwrap();

        assert_eq!(delta.content(), Some("lo"));
        assert_eq!(delta.finish_reason, Some(FinishReason::Stopped));
        assert!(delta.is_final());
    }

    #[test]
    fn test_legacy_delta_ignores_other_choices() {
        let delta: ChatCompletionDelta = serde_json::from_value(json!({
            "choices": [{"index": 1, "delta": {"content": "alt"}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(delta, ChatCompletionDelta::default());

        let delta: ChatCompletionDelta = serde_json::from_value(json!({
            "choices": [
                {"index": 1, "delta": {"content": "alt"}},
                {"index": 0, "delta": {"content": "main"}}
            ]
        }))
        .unwrap();
        assert_eq!(delta.content(), Some("main"));
    }

    #[test]
    fn test_legacy_completion_requires_primary_choice() {
        let result = serde_json::from_value::<ChatCompletion>(json!({
            "choices": [{"index": 1, "message": {"role": "assistant", "content": "alt"}}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_delta_is_permissive() {
        let delta: ChatCompletionDelta =
            serde_json::from_value(json!({"unexpected": 1, "finish_reason": null})).unwrap();
        assert_eq!(delta, ChatCompletionDelta::default());
    }

    #[test]
    fn test_delta_serializes_flat_shape() {
        let delta = ChatCompletionDelta::new(ChatMessageDelta::content("!"))
            .with_finish_reason(FinishReason::Stopped);
        assert_eq!(
            serde_json::to_value(&delta).unwrap(),
            json!({"delta": {"content": "!"}, "finishReason": "stop"})
        );
    }
}
