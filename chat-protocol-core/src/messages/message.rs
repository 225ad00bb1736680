//! Chat messages and their streaming deltas.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::{CoreError, Result};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions that steer the assistant.
    System,
    /// The end user.
    User,
    /// The model.
    Assistant,
}

impl ChatRole {
    /// Wire representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary attachment on a message.
///
/// Files never appear in the JSON body; a request carrying files is sent as
/// `multipart/form-data` with one part per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatFile {
    /// MIME type of the payload (e.g. `image/png`).
    pub content_type: String,
    /// Raw file bytes.
    pub data: Bytes,
    /// Optional file name sent in the part's content disposition.
    pub filename: Option<String>,
}

impl ChatFile {
    /// Create a new file attachment.
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
            filename: None,
        }
    }

    /// Set the file name.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// A complete chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
    /// Opaque backend-defined context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Binary attachments (sent as multipart parts, never serialized).
    #[serde(skip)]
    pub files: Vec<ChatFile>,
}

impl ChatMessage {
    /// Create a new message.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            context: None,
            files: Vec::new(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Attach opaque context.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Attach a file.
    #[must_use]
    pub fn with_file(mut self, file: ChatFile) -> Self {
        self.files.push(file);
        self
    }

    /// Whether the message carries file attachments.
    #[must_use]
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Check that the message can be sent.
    pub fn validate(&self) -> Result<()> {
        if self.content.is_empty() {
            return Err(CoreError::invalid_message(format!(
                "{} message content must not be empty",
                self.role
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.content)
    }
}

/// A partial message carried by a streaming delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageDelta {
    /// Role, usually present only on the first delta of a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ChatRole>,
    /// Content fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Opaque backend-defined context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl ChatMessageDelta {
    /// Create a delta carrying only a content fragment.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: ChatRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Whether the delta carries neither role, content nor context.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.content.is_none() && self.context.is_none()
    }
}
