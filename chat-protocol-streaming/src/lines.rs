//! Async line stream over a byte source.

use crate::decoder::LineDecoder;
use crate::error::{StreamError, StreamResult};
use futures::Stream;
use pin_project_lite::pin_project;
use std::error::Error as StdError;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// Stream adapter that yields complete lines from a byte stream.
    ///
    /// The byte source is dropped as soon as the stream ends, fails, or is
    /// closed, which releases the underlying connection.
    pub struct LineStream<S> {
        #[pin]
        inner: Option<S>,
        decoder: LineDecoder,
        done: bool,
    }
}

impl<S> LineStream<S> {
    /// Create a new line stream with a default decoder.
    pub fn new(inner: S) -> Self {
        Self::with_decoder(inner, LineDecoder::new())
    }

    /// Create a new line stream with a configured decoder.
    pub fn with_decoder(inner: S, decoder: LineDecoder) -> Self {
        Self {
            inner: Some(inner),
            decoder,
            done: false,
        }
    }

    /// Whether the stream has finished.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Stop reading and release the byte source.
    pub fn close(self: Pin<&mut Self>) {
        let mut this = self.project();
        this.inner.set(None);
        this.decoder.clear();
        *this.done = true;
    }
}

impl<S, B, E> Stream for LineStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    type Item = StreamResult<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if *this.done {
                return Poll::Ready(None);
            }

            // Drain complete lines before pulling another chunk
            match this.decoder.next_line() {
                Ok(Some(line)) => return Poll::Ready(Some(Ok(line))),
                Ok(None) => {}
                Err(error) => {
                    this.inner.set(None);
                    this.decoder.clear();
                    *this.done = true;
                    return Poll::Ready(Some(Err(error)));
                }
            }

            let Some(inner) = this.inner.as_mut().as_pin_mut() else {
                *this.done = true;
                return Poll::Ready(None);
            };

            match inner.poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.decoder.feed(chunk.as_ref()),
                Poll::Ready(Some(Err(error))) => {
                    this.inner.set(None);
                    this.decoder.clear();
                    *this.done = true;
                    return Poll::Ready(Some(Err(StreamError::connection(error))));
                }
                Poll::Ready(None) => {
                    this.inner.set(None);
                    *this.done = true;
                    return Poll::Ready(this.decoder.finish().map(Ok));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
