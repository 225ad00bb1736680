//! Request credentials.
//!
//! A [`Credential`] signs each outgoing request by adding headers. Storage and
//! refresh of secrets is left to [`TokenProvider`] implementations.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::fmt;
use std::sync::Arc;

/// Signs outgoing requests.
#[async_trait]
pub trait Credential: Send + Sync + fmt::Debug {
    /// Add authentication headers to `headers`.
    async fn apply(&self, headers: &mut HeaderMap) -> ClientResult<()>;
}

/// Supplies bearer tokens, possibly fetching or refreshing them.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token valid for the next request.
    async fn token(&self) -> ClientResult<String>;
}

/// Sends a fixed key in a header (`api-key` by default).
#[derive(Clone)]
pub struct ApiKeyCredential {
    header: HeaderName,
    key: String,
}

impl ApiKeyCredential {
    /// Create a credential sent in the `api-key` header.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            header: HeaderName::from_static(crate::config::DEFAULT_API_KEY_HEADER),
            key: key.into(),
        }
    }

    /// Send the key in a different header.
    pub fn with_header(mut self, header: &str) -> ClientResult<Self> {
        self.header = HeaderName::from_bytes(header.as_bytes())
            .map_err(|e| ClientError::configuration(format!("invalid header name '{header}': {e}")))?;
        Ok(self)
    }

    /// Header the key is sent in.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl fmt::Debug for ApiKeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyCredential")
            .field("header", &self.header)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl Credential for ApiKeyCredential {
    async fn apply(&self, headers: &mut HeaderMap) -> ClientResult<()> {
        let mut value = HeaderValue::from_str(&self.key)
            .map_err(|_| ClientError::auth("API key is not a valid header value"))?;
        value.set_sensitive(true);
        headers.insert(self.header.clone(), value);
        Ok(())
    }
}

/// Returns the same token on every call.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create with a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> ClientResult<String> {
        Ok(self.token.clone())
    }
}

/// Sends `Authorization: Bearer <token>` with a token from a [`TokenProvider`].
#[derive(Clone)]
pub struct BearerTokenCredential {
    provider: Arc<dyn TokenProvider>,
}

impl BearerTokenCredential {
    /// Create from a token provider.
    pub fn new(provider: impl TokenProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Create from a fixed token.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(StaticTokenProvider::new(token))
    }
}

impl fmt::Debug for BearerTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenCredential").finish_non_exhaustive()
    }
}

#[async_trait]
impl Credential for BearerTokenCredential {
    async fn apply(&self, headers: &mut HeaderMap) -> ClientResult<()> {
        let token = self.provider.token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::auth("bearer token is not a valid header value"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}
