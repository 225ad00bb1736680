//! Streamed completions.

use crate::error::{ClientError, ClientResult};
use bytes::Bytes;
use chat_protocol_core::{ChatCompletion, ChatCompletionDelta};
use chat_protocol_streaming::{CompletionAccumulator, JsonLinesStream, LineDecoder, StreamState};
use futures::stream::FusedStream;
use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

/// Response body as a boxed byte stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

pin_project! {
    /// Single-pass stream of completion deltas.
    ///
    /// Reading drives the HTTP response body. Dropping the stream, or
    /// cancelling it, releases the connection.
    pub struct ChatCompletionStream {
        #[pin]
        inner: JsonLinesStream<ByteStream, ChatCompletionDelta>,
    }
}

impl ChatCompletionStream {
    /// Wrap a response body.
    pub fn new<S>(body: S, decoder: LineDecoder) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        let body: ByteStream = Box::pin(body);
        Self {
            inner: JsonLinesStream::with_decoder(body, decoder),
        }
    }

    /// End the stream when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        Self {
            inner: self.inner.with_cancellation(token),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.inner.state()
    }

    /// Read the rest of the stream into a single completion.
    pub async fn collect_completion(self) -> ClientResult<ChatCompletion> {
        CompletionAccumulator::collect(self).await
    }
}

impl std::fmt::Debug for ChatCompletionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionStream")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Stream for ChatCompletionStream {
    type Item = ClientResult<ChatCompletionDelta>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project()
            .inner
            .poll_next(cx)
            .map(|item| item.map(|result| result.map_err(ClientError::from)))
    }
}

impl FusedStream for ChatCompletionStream {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_protocol_core::{ChatError, FinishReason};
    use futures::{stream, StreamExt};
    use pretty_assertions::assert_eq;

    fn body(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send {
        stream::iter(
            parts
                .iter()
                .map(|part| Ok(Bytes::from_static(part.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_collect_completion() {
        let stream = ChatCompletionStream::new(
            body(&[
                "{\"delta\":{\"role\":\"assistant\",\"content\":\"Hi\"}}\n",
                "{\"delta\":{\"content\":\"!\"},\"finishReason\":\"stop\"}\n",
            ]),
            LineDecoder::new(),
        );

        let completion = stream.collect_completion().await.unwrap();
        assert_eq!(completion.content(), "Hi!");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stopped));
    }

    #[tokio::test]
    async fn test_error_record_maps_to_protocol_error() {
        let mut stream = ChatCompletionStream::new(
            body(&[
                "{\"delta\":{\"content\":\"a\"}}\n",
                "{\"error\":{\"code\":\"E1\",\"message\":\"boom\"}}\n",
                "{\"delta\":{\"content\":\"b\"}}\n",
            ]),
            LineDecoder::new(),
        );

        assert_eq!(stream.next().await.unwrap().unwrap().content(), Some("a"));
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
        assert_eq!(err.chat_error(), Some(&ChatError::new("E1", "boom")));
        assert!(stream.next().await.is_none());
        assert_eq!(stream.state(), StreamState::Errored);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let token = CancellationToken::new();
        let mut stream = ChatCompletionStream::new(
            body(&["{\"delta\":{\"content\":\"a\"}}\n", "{\"delta\":{\"content\":\"b\"}}\n"]),
            LineDecoder::new(),
        )
        .with_cancellation(token.clone());

        assert!(stream.next().await.is_some());
        token.cancel();
        assert!(stream.next().await.is_none());
        assert_eq!(stream.state(), StreamState::Cancelled);
        assert!(stream.is_terminated());
    }
}
