//! Delta accumulation.
//!
//! Folds a sequence of [`ChatCompletionDelta`]s into the [`ChatCompletion`]
//! a non-streaming call would have returned.

use chat_protocol_core::{ChatCompletion, ChatCompletionDelta, ChatMessage, ChatRole, FinishReason};
use futures::{Stream, TryStreamExt};
use serde_json::Value;
use tracing::warn;

/// Accumulates streamed deltas into a complete response.
#[derive(Debug, Clone, Default)]
pub struct CompletionAccumulator {
    role: Option<ChatRole>,
    content: String,
    message_context: Option<Value>,
    session_state: Option<Value>,
    context: Option<Value>,
    finish_reason: Option<FinishReason>,
    deltas: usize,
}

impl CompletionAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a delta.
    ///
    /// Content is concatenated; role, context, session state and finish
    /// reason keep the last value seen.
    pub fn push(&mut self, delta: &ChatCompletionDelta) {
        if self.finish_reason.is_some() {
            warn!(deltas = self.deltas, "Delta received after finish reason");
        }
        self.deltas += 1;

        if let Some(role) = delta.delta.role {
            self.role = Some(role);
        }
        if let Some(content) = &delta.delta.content {
            self.content.push_str(content);
        }
        if let Some(context) = &delta.delta.context {
            self.message_context = Some(context.clone());
        }
        if let Some(session_state) = &delta.session_state {
            self.session_state = Some(session_state.clone());
        }
        if let Some(context) = &delta.context {
            self.context = Some(context.clone());
        }
        if let Some(reason) = &delta.finish_reason {
            self.finish_reason = Some(reason.clone());
        }
    }

    /// Content accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Latest session state.
    pub fn session_state(&self) -> Option<&Value> {
        self.session_state.as_ref()
    }

    /// Finish reason, once the closing delta has arrived.
    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.finish_reason.as_ref()
    }

    /// Number of deltas applied.
    pub fn len(&self) -> usize {
        self.deltas
    }

    /// Whether no delta has been applied.
    pub fn is_empty(&self) -> bool {
        self.deltas == 0
    }

    /// Build the completion. The role defaults to assistant.
    pub fn into_completion(self) -> ChatCompletion {
        let mut message = ChatMessage::new(self.role.unwrap_or(ChatRole::Assistant), self.content);
        message.context = self.message_context;

        ChatCompletion {
            message,
            session_state: self.session_state,
            context: self.context,
            finish_reason: self.finish_reason,
        }
    }

    /// Drain a delta stream into a completion.
    ///
    /// Stops at the first error and returns it.
    pub async fn collect<S, E>(stream: S) -> Result<ChatCompletion, E>
    where
        S: Stream<Item = Result<ChatCompletionDelta, E>>,
    {
        let accumulator = stream
            .try_fold(Self::new(), |mut acc, delta| async move {
                acc.push(&delta);
                Ok(acc)
            })
            .await?;
        Ok(accumulator.into_completion())
    }
}

impl Extend<ChatCompletionDelta> for CompletionAccumulator {
    fn extend<I: IntoIterator<Item = ChatCompletionDelta>>(&mut self, iter: I) {
        for delta in iter {
            self.push(&delta);
        }
    }
}
