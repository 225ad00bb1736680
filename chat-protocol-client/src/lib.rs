//! # chat-protocol-client
//!
//! HTTP client for AI Chat Protocol endpoints.
//!
//! A [`ChatProtocolClient`] POSTs a conversation to a single endpoint and
//! returns either one [`ChatCompletion`](chat_protocol_core::ChatCompletion)
//! or a [`ChatCompletionStream`] of deltas decoded from a JSON-lines body.
//!
//! - Non-streaming requests go to the endpoint itself.
//! - Streaming requests go to the endpoint joined with
//!   [`ClientConfig::stream_path`] (`/stream` by default).
//! - Messages with file attachments are sent as `multipart/form-data`.
//! - Requests are signed by an optional [`Credential`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use chat_protocol_client::{ChatProtocolClient, ClientConfig};
//! use chat_protocol_core::{ChatCompletionOptions, ChatMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://chat.example.com/api/chat")?
//!         .with_api_key(std::env::var("CHAT_PROTOCOL_API_KEY")?);
//!     let client = ChatProtocolClient::from_config(config)?;
//!
//!     let first = client
//!         .get_completion(vec![ChatMessage::user("Hi!")], ChatCompletionOptions::default())
//!         .await?;
//!
//!     // Carry the session forward.
//!     let options = ChatCompletionOptions::continuing(&first);
//!     let stream = client
//!         .get_streamed_completion(
//!             vec![ChatMessage::user("Hi!"), first.message, ChatMessage::user("More?")],
//!             options,
//!         )
//!         .await?;
//!     println!("{}", stream.collect_completion().await?.content());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod stream;

// Re-exports
pub use client::ChatProtocolClient;
pub use config::{ClientConfig, DEFAULT_ENV_PREFIX, DEFAULT_STREAM_PATH, DEFAULT_USER_AGENT};
pub use credential::{
    ApiKeyCredential, BearerTokenCredential, Credential, StaticTokenProvider, TokenProvider,
};
pub use error::{ClientError, ClientResult};
pub use stream::ChatCompletionStream;

// Re-export for callers that configure streams directly
pub use chat_protocol_streaming::{StreamState, TrailingLine};
pub use tokio_util::sync::CancellationToken;
