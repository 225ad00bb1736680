//! Failed responses whose body cannot be read in full.
//!
//! Runs in its own binary so the scoped log capture does not interfere with
//! the global subscriber installed by the other integration tests.

use chat_protocol_client::{ChatProtocolClient, ClientError};
use chat_protocol_core::{ChatCompletionOptions, ChatMessage};
use std::io;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Answers one request with a 500 whose body is cut short.
async fn truncating_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(end) = text.find("\r\n\r\n") {
                if request.len() >= end + 4 + content_length(&text[..end]) {
                    break;
                }
            }
        }

        socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 64\r\n\r\n\
                  {\"error\":",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{addr}/api/chat")
}

#[tokio::test]
async fn unreadable_error_body_is_logged() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let client = ChatProtocolClient::new(truncating_backend().await).unwrap();
    let err = client
        .get_completion(
            vec![ChatMessage::user("Hello")],
            ChatCompletionOptions::default(),
        )
        .await
        .unwrap_err();

    match err {
        ClientError::Transport {
            status,
            body,
            error,
            ..
        } => {
            assert_eq!(status, 500);
            assert!(body.is_empty());
            assert!(error.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let logs = logs.contents();
    assert!(logs.contains("WARN"), "logs: {logs}");
    assert!(logs.contains("Failed to read error response body"), "logs: {logs}");
}
