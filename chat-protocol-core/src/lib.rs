//! # chat-protocol-core
//!
//! Core types and errors for the AI Chat Protocol.
//!
//! This crate provides the protocol data model shared by the streaming decoder
//! and the HTTP client:
//!
//! - **Messages**: [`ChatMessage`], [`ChatMessageDelta`], [`ChatRole`] and file attachments
//! - **Completions**: [`ChatCompletion`] and the streaming unit [`ChatCompletionDelta`]
//! - **Requests**: [`ChatCompletionRequest`] and the caller-facing [`ChatCompletionOptions`]
//! - **Errors**: the in-band [`ChatError`] record and [`CoreError`]
//!
//! Session state and context are opaque [`serde_json::Value`]s. They are stored
//! and replayed verbatim, never interpreted.
//!
//! ## Feature Flags
//!
//! - `tracing-integration`: Emit `tracing` events when normalizing legacy payloads
//!
//! ## Example
//!
//! ```rust
//! use chat_protocol_core::{ChatCompletion, ChatMessage, ChatRole, FinishReason};
//!
//! let message = ChatMessage::user("What is the capital of France?");
//! assert_eq!(message.role, ChatRole::User);
//!
//! // Both the flat and the legacy `choices` wire shapes decode to the same value.
//! let flat: ChatCompletion = serde_json::from_str(
//!     r#"{"message":{"role":"assistant","content":"Paris"},"finishReason":"stop"}"#,
//! ).unwrap();
//! let legacy: ChatCompletion = serde_json::from_str(
//!     r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Paris"},"finish_reason":"stop"}]}"#,
//! ).unwrap();
//! assert_eq!(flat, legacy);
//! assert_eq!(flat.finish_reason, Some(FinishReason::Stopped));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod errors;
pub mod messages;

// Re-exports for convenience
pub use errors::{ChatError, CoreError, Result};
pub use messages::{
    ChatCompletion, ChatCompletionDelta, ChatCompletionOptions, ChatCompletionRequest, ChatFile,
    ChatMessage, ChatMessageDelta, ChatRole, FinishReason,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::errors::{ChatError, CoreError, Result};
    pub use crate::messages::{
        ChatCompletion, ChatCompletionDelta, ChatCompletionOptions, ChatCompletionRequest,
        ChatFile, ChatMessage, ChatMessageDelta, ChatRole, FinishReason,
    };
}
