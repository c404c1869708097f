//! HTTP fetching for pages and manifests, wrapping reqwest.
//!
//! A single GET per call. No retries and no backoff: failures propagate to
//! the caller unchanged.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::ExtractResult;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default browser user agent. The provider serves a stripped page to
/// unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

/// Settings for the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 5,
        }
    }
}

/// Something that can download a URL as text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body. Non-success statuses are errors.
    async fn fetch(&self, url: &str) -> ExtractResult<String>;
}

/// reqwest-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Build a client from `config`.
    pub fn new(config: &ClientConfig) -> ExtractResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(&self, url: &str) -> ExtractResult<String> {
        tracing::debug!(url, "GET");
        let resp = self.client.get(url).send().await?.error_for_status()?;
        tracing::debug!(url, status = resp.status().as_u16(), "response");
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(&ClientConfig::default());
        assert!(client.is_ok());
    }
}
