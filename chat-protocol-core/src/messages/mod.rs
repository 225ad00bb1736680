//! Message types for chat protocol interactions.
//!
//! - **Messages**: [`ChatMessage`], [`ChatMessageDelta`], [`ChatRole`], [`ChatFile`]
//! - **Completions**: [`ChatCompletion`], [`ChatCompletionDelta`], [`FinishReason`]
//! - **Requests**: [`ChatCompletionRequest`], [`ChatCompletionOptions`]
//!
//! ## Example
//!
//! ```rust
//! use chat_protocol_core::messages::{
//!     ChatCompletionOptions, ChatCompletionRequest, ChatMessage,
//! };
//!
//! let request = ChatCompletionRequest::new(
//!     vec![ChatMessage::system("Be brief."), ChatMessage::user("Hello!")],
//!     ChatCompletionOptions::new().with_session_state(serde_json::json!("abc")),
//!     true,
//! );
//! request.validate().unwrap();
//!
//! let body = serde_json::to_value(&request).unwrap();
//! assert_eq!(body["stream"], true);
//! assert_eq!(body["sessionState"], "abc");
//! ```

pub mod completion;
pub mod message;
pub mod request;

// Re-exports for convenience
pub use completion::{ChatCompletion, ChatCompletionDelta, FinishReason};
pub use message::{ChatFile, ChatMessage, ChatMessageDelta, ChatRole};
pub use request::{ChatCompletionOptions, ChatCompletionRequest};
