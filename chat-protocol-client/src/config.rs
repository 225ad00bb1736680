//! Client configuration.

use crate::error::{ClientError, ClientResult};
use chat_protocol_streaming::{LineDecoder, TrailingLine, DEFAULT_MAX_LINE_LENGTH};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "CHAT_PROTOCOL";

/// Default suffix appended to the endpoint path for streaming requests.
pub const DEFAULT_STREAM_PATH: &str = "/stream";

/// Default `api-key` header name.
pub const DEFAULT_API_KEY_HEADER: &str = "api-key";

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("chat-protocol-rust/", env!("CARGO_PKG_VERSION"));

/// Configuration for a [`ChatProtocolClient`](crate::ChatProtocolClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Absolute endpoint URL for non-streaming requests.
    pub endpoint: Url,
    /// Suffix appended to the endpoint path for streaming requests.
    pub stream_path: String,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// User agent header value.
    pub user_agent: String,
    /// What to do with an unterminated final line.
    pub trailing_line: TrailingLine,
    /// Maximum length of a single streamed line in bytes.
    pub max_line_length: usize,
    /// API key sent in [`api_key_header`](Self::api_key_header).
    pub api_key: Option<String>,
    /// Static bearer token.
    pub bearer_token: Option<String>,
    /// Header name for the API key.
    pub api_key_header: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("stream_path", &self.stream_path)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .field("trailing_line", &self.trailing_line)
            .field("max_line_length", &self.max_line_length)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_key_header", &self.api_key_header)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config for an absolute `http` or `https` endpoint.
    pub fn new(endpoint: impl AsRef<str>) -> ClientResult<Self> {
        let endpoint = parse_endpoint(endpoint.as_ref())?;
        Ok(Self {
            endpoint,
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            timeout: None,
            connect_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            trailing_line: TrailingLine::default(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            api_key: None,
            bearer_token: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
        })
    }

    /// Set the streaming path suffix. An empty suffix streams from the endpoint itself.
    #[must_use]
    pub fn with_stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    /// Set timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the trailing-line policy.
    #[must_use]
    pub fn with_trailing_line(mut self, trailing_line: TrailingLine) -> Self {
        self.trailing_line = trailing_line;
        self
    }

    /// Set the maximum streamed line length.
    #[must_use]
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Set API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the header the API key is sent in.
    #[must_use]
    pub fn with_api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    /// Set a static bearer token.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Load from environment variables with given prefix.
    ///
    /// Looks for:
    /// - `{PREFIX}_ENDPOINT` (required)
    /// - `{PREFIX}_API_KEY`
    /// - `{PREFIX}_BEARER_TOKEN`
    /// - `{PREFIX}_STREAM_PATH`
    /// - `{PREFIX}_TIMEOUT_SECS`
    pub fn from_env(prefix: &str) -> ClientResult<Self> {
        let var = |name: &str| std::env::var(format!("{prefix}_{name}")).ok();

        let endpoint = var("ENDPOINT")
            .ok_or_else(|| ClientError::configuration(format!("{prefix}_ENDPOINT is not set")))?;
        let mut config = Self::new(endpoint)?;

        config.api_key = var("API_KEY");
        config.bearer_token = var("BEARER_TOKEN");
        if let Some(path) = var("STREAM_PATH") {
            config.stream_path = path;
        }
        if let Some(secs) = var("TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::configuration(format!("{prefix}_TIMEOUT_SECS must be a whole number"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Load from environment variables with the default prefix.
    pub fn from_default_env() -> ClientResult<Self> {
        Self::from_env(DEFAULT_ENV_PREFIX)
    }

    /// URL for streaming requests: the endpoint path joined with the stream path.
    pub fn stream_url(&self) -> Url {
        let suffix = self.stream_path.trim_matches('/');
        if suffix.is_empty() {
            return self.endpoint.clone();
        }

        let mut url = self.endpoint.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), suffix);
        url.set_path(&path);
        url
    }

    /// Line decoder configured for this client.
    pub fn decoder(&self) -> LineDecoder {
        LineDecoder::new()
            .with_trailing_line(self.trailing_line)
            .with_max_line_length(self.max_line_length)
    }
}

fn parse_endpoint(endpoint: &str) -> ClientResult<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| ClientError::configuration(format!("invalid endpoint '{endpoint}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ClientError::configuration(format!(
            "unsupported endpoint scheme '{scheme}'"
        ))),
    }
}
