//! # chat-protocol - AI Chat Protocol client for Rust
//!
//! A client for backends that speak the AI Chat Protocol: a conversation is
//! POSTed as JSON and the reply comes back either as one JSON document or as
//! a stream of newline-delimited JSON (NDJSON) deltas.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chat_protocol::prelude::*;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ChatProtocolClient::new("http://localhost:3000/chat")?;
//!
//!     let mut stream = client
//!         .get_streamed_completion(
//!             vec![ChatMessage::user("What is the capital of France?")],
//!             ChatCompletionOptions::default(),
//!         )
//!         .await?;
//!
//!     while let Some(delta) = stream.next().await {
//!         print!("{}", delta?.content().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Key Features
//!
//! - **Incremental NDJSON decoding** that is correct at any chunk boundary
//! - **Typed protocol model** accepting both flat and legacy `choices` payloads
//! - **In-band error records** surfaced as typed errors
//! - **Session state** carried opaquely between turns
//! - **File attachments** sent as multipart requests
//! - **Pluggable credentials** (API key or bearer token provider)
//! - **Cancellation** via `CancellationToken`
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `tracing-integration` | Trace legacy payload normalization | ❌ |
//!
//! ## Architecture
//!
//! The crate is a facade over a workspace of focused crates:
//!
//! - [`core`]: protocol data model and errors
//! - [`streaming`]: line decoder, record stream, encoder, accumulator
//! - [`client`]: HTTP client, configuration, credentials
//!
//! ## Decoding Without HTTP
//!
//! ```rust
//! use bytes::Bytes;
//! use chat_protocol::{json_lines, ChatCompletionDelta};
//! use futures::{stream, StreamExt};
//!
//! # tokio_test::block_on(async {
//! let chunks = vec![
//!     Ok::<_, std::io::Error>(Bytes::from_static(b"{\"delta\":{\"content\":\"a\"}}\n{\"de")),
//!     Ok(Bytes::from_static(b"lta\":{\"content\":\"b\"}}\n")),
//! ];
//! let deltas: Vec<_> = json_lines::<ChatCompletionDelta, _>(stream::iter(chunks))
//!     .collect()
//!     .await;
//! assert_eq!(deltas.len(), 2);
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// One-shot Requests
// ============================================================================

/// One-shot request functions, async and blocking.
///
/// # Example
///
/// ```rust,ignore
/// use chat_protocol::direct::completion;
/// use chat_protocol::ChatMessage;
///
/// let response = completion(
///     "http://localhost:3000/chat",
///     &[ChatMessage::user("Hello!")],
///     None,
/// ).await?;
/// ```
pub mod direct;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Protocol data model and errors.
pub use chat_protocol_core as core;

/// JSON-lines streaming.
pub use chat_protocol_streaming as streaming;

/// HTTP client.
pub use chat_protocol_client as client;

// ============================================================================
// Type Re-exports (Flat)
// ============================================================================

// Errors
pub use chat_protocol_client::{ClientError, ClientResult};
pub use chat_protocol_core::{ChatError, CoreError};
pub use chat_protocol_streaming::{StreamError, StreamResult};

// Messages
pub use chat_protocol_core::{
    ChatCompletion, ChatCompletionDelta, ChatCompletionOptions, ChatCompletionRequest, ChatFile,
    ChatMessage, ChatMessageDelta, ChatRole, FinishReason,
};

// Streaming
pub use chat_protocol_streaming::{
    json_lines, CompletionAccumulator, JsonLinesEncoder, JsonLinesStream, LineDecoder,
    LineStream, LineTerminator, StreamState, TrailingLine,
};

// Client
pub use chat_protocol_client::{
    ApiKeyCredential, BearerTokenCredential, CancellationToken, ChatCompletionStream,
    ChatProtocolClient, ClientConfig, Credential, StaticTokenProvider, TokenProvider,
};

// One-shot requests
pub use direct::{
    completion, completion_stream, completion_stream_sync, completion_sync, DirectError,
};

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient prelude for common imports.
///
/// ```ignore
/// use chat_protocol::prelude::*;
/// ```
pub mod prelude {
    // Messages
    pub use crate::core::{
        ChatCompletion, ChatCompletionDelta, ChatCompletionOptions, ChatError, ChatFile,
        ChatMessage, ChatRole, FinishReason,
    };

    // Client
    pub use crate::client::{
        CancellationToken, ChatCompletionStream, ChatProtocolClient, ClientConfig, ClientError,
        ClientResult,
    };

    // Streaming
    pub use crate::streaming::{CompletionAccumulator, StreamState, TrailingLine};
}
