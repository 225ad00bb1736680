//! HTTP client for AI Chat Protocol endpoints.

use crate::config::ClientConfig;
use crate::credential::{ApiKeyCredential, BearerTokenCredential, Credential};
use crate::error::{ClientError, ClientResult};
use crate::stream::ChatCompletionStream;
use chat_protocol_core::{
    ChatCompletion, ChatCompletionOptions, ChatCompletionRequest, ChatError, ChatMessage,
};
use mime::Mime;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use url::Url;

/// `Accept` header for non-streaming requests.
const ACCEPT_JSON: &str = "application/json";

/// `Accept` header for streaming requests.
const ACCEPT_JSON_LINES: &str = "application/jsonl, application/x-ndjson, application/json-lines";

/// Content types a streamed response is expected to carry.
const STREAM_CONTENT_TYPES: &[&str] = &[
    "application/jsonl",
    "application/x-ndjson",
    "application/json-lines",
    "text/event-stream",
];

/// Client for a single chat endpoint.
///
/// Cheap to clone; clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use chat_protocol_client::ChatProtocolClient;
/// use chat_protocol_core::{ChatCompletionOptions, ChatMessage};
/// use futures::StreamExt;
///
/// let client = ChatProtocolClient::new("http://localhost:3000/chat")?;
///
/// let completion = client
///     .get_completion(vec![ChatMessage::user("Hello!")], ChatCompletionOptions::default())
///     .await?;
/// println!("{}", completion.content());
///
/// let mut stream = client
///     .get_streamed_completion(vec![ChatMessage::user("Hello!")], ChatCompletionOptions::default())
///     .await?;
/// while let Some(delta) = stream.next().await {
///     print!("{}", delta?.content().unwrap_or_default());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ChatProtocolClient {
    client: Client,
    config: Arc<ClientConfig>,
    credential: Option<Arc<dyn Credential>>,
}

impl ChatProtocolClient {
    /// Create a client for an absolute endpoint URL.
    pub fn new(endpoint: impl AsRef<str>) -> ClientResult<Self> {
        Self::from_config(ClientConfig::new(endpoint)?)
    }

    /// Create from environment variables with the default prefix.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_config(ClientConfig::from_default_env()?)
    }

    /// Create from a config.
    ///
    /// An API key in the config takes precedence over a bearer token.
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::configuration(format!("failed to build HTTP client: {e}")))?;

        let credential: Option<Arc<dyn Credential>> = match (&config.api_key, &config.bearer_token) {
            (Some(key), _) => Some(Arc::new(
                ApiKeyCredential::new(key.clone()).with_header(&config.api_key_header)?,
            )),
            (None, Some(token)) => Some(Arc::new(BearerTokenCredential::from_token(token.clone()))),
            (None, None) => None,
        };

        Ok(Self {
            client,
            config: Arc::new(config),
            credential,
        })
    }

    /// Use a custom HTTP client.
    ///
    /// Timeouts and user agent from the config are not applied to it.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Sign requests with `credential`, replacing any configured one.
    #[must_use]
    pub fn with_credential(mut self, credential: impl Credential + 'static) -> Self {
        self.credential = Some(Arc::new(credential));
        self
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request a complete response.
    pub async fn get_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatCompletionOptions,
    ) -> ClientResult<ChatCompletion> {
        let request = ChatCompletionRequest::new(messages, options, false);
        let response = self
            .send(self.config.endpoint.clone(), &request, ACCEPT_JSON)
            .await?;

        match content_type(&response) {
            Some(mime) if mime.essence_str() == ACCEPT_JSON => {}
            Some(mime) => {
                return Err(ClientError::invalid_response(format!(
                    "expected application/json, got {mime}"
                )))
            }
            None => {
                return Err(ClientError::invalid_response(
                    "response has no content type",
                ))
            }
        }

        let body = response.text().await?;
        trace!(body = %body, "Response body");

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ClientError::invalid_response(format!("response is not JSON: {e}")))?;
        if let Some(error) = ChatError::from_record(&value) {
            return Err(ClientError::Protocol(error));
        }

        serde_json::from_value(value).map_err(|e| ClientError::invalid_response(e.to_string()))
    }

    /// Request a streamed response.
    ///
    /// Fails before returning if the backend answers with a non-2xx status.
    pub async fn get_streamed_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatCompletionOptions,
    ) -> ClientResult<ChatCompletionStream> {
        let request = ChatCompletionRequest::new(messages, options, true);
        let response = self
            .send(self.config.stream_url(), &request, ACCEPT_JSON_LINES)
            .await?;

        match content_type(&response) {
            Some(mime) if STREAM_CONTENT_TYPES.contains(&mime.essence_str()) => {}
            other => warn!(
                content_type = ?other.map(|m| m.to_string()),
                "Unexpected content type for streamed response"
            ),
        }

        Ok(ChatCompletionStream::new(
            response.bytes_stream(),
            self.config.decoder(),
        ))
    }

    async fn send(
        &self,
        url: Url,
        request: &ChatCompletionRequest,
        accept: &'static str,
    ) -> ClientResult<Response> {
        request.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        if let Some(credential) = &self.credential {
            credential.apply(&mut headers).await?;
        }

        debug!(
            method = "POST",
            url = %url,
            stream = request.stream,
            messages = request.messages.len(),
            multipart = request.has_files(),
            "Sending chat request"
        );

        let json = request.to_json()?;
        trace!(body = %json, "Request body");

        let builder = self.client.post(url).headers(headers);
        let builder = if request.has_files() {
            builder.multipart(multipart_form(request, json)?)
        } else {
            builder.header(CONTENT_TYPE, ACCEPT_JSON).body(json)
        };

        let response = builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Received response");

        if !status.is_success() {
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.to_string(), value.to_string()))
                })
                .collect::<HashMap<_, _>>();
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => {
                    warn!(
                        status = status.as_u16(),
                        error = %error,
                        "Failed to read error response body"
                    );
                    String::new()
                }
            };
            return Err(ClientError::from_failed_response(status.as_u16(), body, headers));
        }

        Ok(response)
    }
}

fn content_type(response: &Response) -> Option<Mime> {
    response
        .headers()
        .get(CONTENT_TYPE)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// A `json` part with the request body, then one part per attached file.
fn multipart_form(request: &ChatCompletionRequest, json: String) -> ClientResult<Form> {
    let invalid = |e: reqwest::Error| ClientError::Validation(format!("invalid content type: {e}"));

    let mut form = Form::new().part("json", Part::text(json).mime_str(ACCEPT_JSON).map_err(invalid)?);
    for (name, file) in request.file_parts() {
        let filename = file.filename.clone().unwrap_or_else(|| name.clone());
        let part = Part::bytes(file.data.to_vec())
            .file_name(filename)
            .mime_str(&file.content_type)
            .map_err(invalid)?;
        form = form.part(name, part);
    }
    Ok(form)
}
