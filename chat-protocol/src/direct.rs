//! One-shot request functions.
//!
//! These functions build a client for a single call. Use them for scripts and
//! quick integrations; keep a [`ChatProtocolClient`] around for anything that
//! makes repeated calls.
//!
//! # Examples
//!
//! ## Non-streaming request
//!
//! ```rust,ignore
//! use chat_protocol::direct::completion;
//! use chat_protocol::ChatMessage;
//!
//! let response = completion(
//!     "http://localhost:3000/chat",
//!     &[ChatMessage::user("What is the capital of France?")],
//!     None,
//! ).await?;
//!
//! println!("{}", response.content());
//! ```
//!
//! ## Streaming request
//!
//! ```rust,ignore
//! use chat_protocol::direct::completion_stream;
//! use futures::StreamExt;
//!
//! let mut stream = completion_stream(
//!     "http://localhost:3000/chat",
//!     &[ChatMessage::user("Write a poem")],
//!     None,
//! ).await?;
//!
//! while let Some(delta) = stream.next().await {
//!     print!("{}", delta?.content().unwrap_or_default());
//! }
//! ```
//!
//! ## Blocking code
//!
//! ```rust,ignore
//! use chat_protocol::direct::completion_stream_sync;
//!
//! for delta in completion_stream_sync("http://localhost:3000/chat", &messages, None)? {
//!     print!("{}", delta?.content().unwrap_or_default());
//! }
//! ```

use chat_protocol_client::{ChatCompletionStream, ChatProtocolClient, ClientError, ClientResult};
use chat_protocol_core::{ChatCompletion, ChatCompletionDelta, ChatCompletionOptions, ChatMessage};
use futures::StreamExt;
use thiserror::Error;

/// Error type for one-shot requests.
#[derive(Debug, Error)]
pub enum DirectError {
    /// Client-level error (HTTP, protocol, configuration).
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Runtime error (e.g., sync functions called in async context).
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Where to send a one-shot request: an endpoint URL or a configured client.
#[derive(Debug, Clone)]
pub enum EndpointSpec {
    /// Absolute endpoint URL.
    Url(String),
    /// Pre-built client.
    Client(ChatProtocolClient),
}

impl EndpointSpec {
    fn into_client(self) -> ClientResult<ChatProtocolClient> {
        match self {
            Self::Url(url) => ChatProtocolClient::new(url),
            Self::Client(client) => Ok(client),
        }
    }
}

impl From<&str> for EndpointSpec {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for EndpointSpec {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<ChatProtocolClient> for EndpointSpec {
    fn from(client: ChatProtocolClient) -> Self {
        Self::Client(client)
    }
}

/// Request a complete response.
pub async fn completion(
    endpoint: impl Into<EndpointSpec>,
    messages: &[ChatMessage],
    options: Option<ChatCompletionOptions>,
) -> Result<ChatCompletion, DirectError> {
    let client = endpoint.into().into_client()?;
    Ok(client
        .get_completion(messages.to_vec(), options.unwrap_or_default())
        .await?)
}

/// Request a streamed response.
pub async fn completion_stream(
    endpoint: impl Into<EndpointSpec>,
    messages: &[ChatMessage],
    options: Option<ChatCompletionOptions>,
) -> Result<ChatCompletionStream, DirectError> {
    let client = endpoint.into().into_client()?;
    Ok(client
        .get_streamed_completion(messages.to_vec(), options.unwrap_or_default())
        .await?)
}

fn blocking_runtime(caller: &str) -> Result<tokio::runtime::Runtime, DirectError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(DirectError::RuntimeError(format!(
            "{caller} cannot be called from async context"
        )));
    }

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DirectError::RuntimeError(format!("Failed to create runtime: {e}")))
}

/// Blocking version of [`completion`].
///
/// Returns [`DirectError::RuntimeError`] when called inside a Tokio runtime.
pub fn completion_sync(
    endpoint: impl Into<EndpointSpec>,
    messages: &[ChatMessage],
    options: Option<ChatCompletionOptions>,
) -> Result<ChatCompletion, DirectError> {
    let runtime = blocking_runtime("completion_sync")?;
    runtime.block_on(completion(endpoint, messages, options))
}

/// Blocking iterator over a streamed response.
///
/// Owns the runtime the response body is read on.
pub struct CompletionStreamSync {
    runtime: tokio::runtime::Runtime,
    stream: ChatCompletionStream,
}

impl std::fmt::Debug for CompletionStreamSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionStreamSync")
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

impl CompletionStreamSync {
    /// Read the rest of the stream into a single completion.
    pub fn collect_completion(self) -> ClientResult<ChatCompletion> {
        let Self { runtime, stream } = self;
        runtime.block_on(stream.collect_completion())
    }
}

impl Iterator for CompletionStreamSync {
    type Item = ClientResult<ChatCompletionDelta>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}

/// Blocking version of [`completion_stream`].
///
/// Returns [`DirectError::RuntimeError`] when called inside a Tokio runtime.
pub fn completion_stream_sync(
    endpoint: impl Into<EndpointSpec>,
    messages: &[ChatMessage],
    options: Option<ChatCompletionOptions>,
) -> Result<CompletionStreamSync, DirectError> {
    let runtime = blocking_runtime("completion_stream_sync")?;
    let stream = runtime.block_on(completion_stream(endpoint, messages, options))?;
    Ok(CompletionStreamSync { runtime, stream })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn start_backend(runtime: &tokio::runtime::Runtime) -> MockServer {
        runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/chat"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "message": {"role": "assistant", "content": "Paris."},
                    "finishReason": "stop"
                })))
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/chat/stream"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(
                    "{\"delta\":{\"content\":\"Par\"}}\n{\"delta\":{\"content\":\"is.\"}}\n",
                    "application/x-ndjson",
                ))
                .mount(&server)
                .await;
            server
        })
    }

    #[test]
    fn test_endpoint_spec_from_str() {
        let spec: EndpointSpec = "http://localhost:3000/chat".into();
        assert!(matches!(spec, EndpointSpec::Url(ref s) if s == "http://localhost:3000/chat"));
    }

    #[test]
    fn test_endpoint_spec_from_client() {
        let client = ChatProtocolClient::new("http://localhost:3000/chat").unwrap();
        let spec: EndpointSpec = client.into();
        assert!(matches!(spec, EndpointSpec::Client(_)));
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = completion_sync("not a url", &[ChatMessage::user("hi")], None).unwrap_err();
        assert!(matches!(err, DirectError::Client(ClientError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_sync_rejected_in_async_context() {
        let err = completion_sync("http://localhost:3000/chat", &[ChatMessage::user("hi")], None)
            .unwrap_err();
        assert!(matches!(err, DirectError::RuntimeError(_)));
    }

    #[test]
    fn test_completion_sync() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = start_backend(&runtime);
        let endpoint = format!("{}/chat", server.uri());

        let response = completion_sync(endpoint.as_str(), &[ChatMessage::user("Capital of France?")], None)
            .unwrap();
        assert_eq!(response.content(), "Paris.");

        let deltas: Vec<_> = completion_stream_sync(endpoint, &[ChatMessage::user("Capital of France?")], None)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        let content: String = deltas.iter().filter_map(|d| d.content()).collect();
        assert_eq!(content, "Paris.");
    }
}
