use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

use crate::util::{validate_url, TargetPolicy, UrlValidationError};

/// User-Agent sent when the caller does not supply one.
pub const DEFAULT_USER_AGENT: &str = "rssify/1.1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_PAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching a page.
///
/// Every variant ends the request; nothing here is retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The target is not a usable http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// The target points at an address the configured policy refuses
    #[error("Blocked URL: {0}")]
    Blocked(String),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The whole exchange exceeded the fetch timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
}

impl From<UrlValidationError> for FetchError {
    fn from(e: UrlValidationError) -> Self {
        match e {
            UrlValidationError::Localhost | UrlValidationError::PrivateAddress(_) => {
                FetchError::Blocked(e.to_string())
            }
            _ => FetchError::InvalidUrl(e.to_string()),
        }
    }
}

/// Source of raw page HTML.
///
/// The request handler only talks to this trait, so tests can swap in
/// a double that counts calls or returns canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url` and return the body as text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`PageSource`] backed by `reqwest`.
///
/// Performs exactly one GET per call with a fixed timeout. Redirects follow
/// the client's default policy.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
    policy: TargetPolicy,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            policy: TargetPolicy::Open,
            max_body_bytes: MAX_PAGE_SIZE,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_policy(mut self, policy: TargetPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Fetches `url`, sending `user_agent` instead of the configured agent
    /// when one is given.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] / [`FetchError::Blocked`] - rejected before sending
    /// - [`FetchError::Network`] - connection or TLS errors
    /// - [`FetchError::Timeout`] - request plus body read exceeded the timeout
    /// - [`FetchError::HttpStatus`] - non-2xx response
    /// - [`FetchError::ResponseTooLarge`] - body exceeded the size limit
    pub async fn fetch_with_agent(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<String, FetchError> {
        let target = validate_url(url, self.policy)?;
        let agent = user_agent.unwrap_or(&self.user_agent);

        let exchange = async {
            let response = self
                .client
                .get(target.as_str())
                .header(reqwest::header::USER_AGENT, agent)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(FetchError::HttpStatus(response.status().as_u16()));
            }

            read_limited_text(response, self.max_body_bytes).await
        };

        let result = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };

        match &result {
            Ok(body) => tracing::debug!(url = %url, bytes = body.len(), "Fetched page"),
            Err(e) => tracing::warn!(url = %url, error = %e, "Page fetch failed"),
        }

        result
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_with_agent(url, None).await
    }
}

/// Reads the body up to `limit` bytes. Invalid UTF-8 is replaced rather
/// than rejected, since scraped pages are often sloppy about encoding.
async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
