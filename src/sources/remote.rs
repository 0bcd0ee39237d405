//! Remote HTTP/HTTPS fetcher.

use super::Fetcher;
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::HeaderValue};
use std::time::Duration;

/// Default request timeout for remote fetches.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Authentication method for HTTP requests.
#[derive(Clone)]
pub enum HttpAuth {
    /// No authentication
    None,
    /// Bearer token authentication
    Bearer(String),
    /// Basic authentication (username, password)
    Basic(String, String),
}

/// Fetches configuration with an HTTP GET against a fixed URL.
///
/// Only a `200 OK` response counts; any other status, a connection error,
/// or a timeout fails the fetch. Redirects follow the client default.
///
/// # Examples
///
/// ```rust,no_run
/// use polled_config::sources::RemoteFetcher;
/// use std::time::Duration;
///
/// # fn example() -> polled_config::error::Result<()> {
/// let fetcher = RemoteFetcher::builder()
///     .with_url("https://config.example.com/api/config")
///     .with_auth_token("secret-token")
///     .with_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RemoteFetcher {
    url: Url,
    client: Client,
    auth: HttpAuth,
}

impl RemoteFetcher {
    /// Create a fetcher for `url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::builder().with_url(url).build()
    }

    /// Create a new builder for constructing a remote fetcher.
    pub fn builder() -> RemoteFetcherBuilder {
        RemoteFetcherBuilder::new()
    }

    /// The URL being polled.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Fetcher for RemoteFetcher {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let mut request = self.client.get(self.url.clone());

        request = match &self.auth {
            HttpAuth::None => request,
            HttpAuth::Bearer(token) => {
                let header_value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ConfigError::fetch(self.describe(), format!("invalid bearer token: {}", e)))?;
                request.header("Authorization", header_value)
            }
            HttpAuth::Basic(username, password) => request.basic_auth(username, Some(password)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ConfigError::fetch(self.describe(), format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ConfigError::fetch(
                self.describe(),
                format!(
                    "unexpected status {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ConfigError::fetch(self.describe(), format!("failed to read body: {}", e)))?;

        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        format!("http:{}", self.url)
    }
}

/// Builder for constructing a [`RemoteFetcher`].
pub struct RemoteFetcherBuilder {
    url: Option<String>,
    auth: HttpAuth,
    timeout: Duration,
}

impl RemoteFetcherBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: None,
            auth: HttpAuth::None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Set the URL to fetch configuration from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set Bearer token authentication.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = HttpAuth::Bearer(token.into());
        self
    }

    /// Set Basic authentication.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = HttpAuth::Basic(username.into(), password.into());
        self
    }

    /// Set the request timeout. This bounds connect, send, and body read.
    ///
    /// Default is 10 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the remote fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No URL is provided, or it is not an absolute URL
    /// - The HTTP client cannot be constructed
    pub fn build(self) -> Result<RemoteFetcher> {
        let raw = self
            .url
            .ok_or_else(|| ConfigError::InvalidSource("URL is required for RemoteFetcher".to_string()))?;

        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidSource(format!("Malformed url={}: {}", raw, e)))?;

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ConfigError::InvalidSource(format!("Failed to create HTTP client: {}", e)))?;

        Ok(RemoteFetcher {
            url,
            client,
            auth: self.auth,
        })
    }
}

impl Default for RemoteFetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let fetcher = RemoteFetcher::builder()
            .with_url("https://example.com/config")
            .with_auth_token("token123")
            .with_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(fetcher.url().as_str(), "https://example.com/config");
        assert_eq!(fetcher.describe(), "http:https://example.com/config");
    }

    #[test]
    fn test_builder_no_url() {
        let result = RemoteFetcher::builder().build();
        assert!(matches!(result, Err(ConfigError::InvalidSource(_))));
    }

    #[test]
    fn test_builder_malformed_url() {
        let result = RemoteFetcher::new("not a url");
        assert!(matches!(result, Err(ConfigError::InvalidSource(_))));
    }

    #[test]
    fn test_builder_with_basic_auth() {
        let fetcher = RemoteFetcher::builder()
            .with_url("https://example.com/config")
            .with_basic_auth("user", "pass")
            .build();

        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/config")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"foo": {"bar": "baz"}}"#)
            .create_async()
            .await;

        let fetcher = RemoteFetcher::new(format!("{}/config", server.url())).unwrap();
        let body = fetcher.fetch().await.unwrap();

        assert_eq!(body, br#"{"foo": {"bar": "baz"}}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/config")
            .match_header("authorization", "Bearer token123")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let fetcher = RemoteFetcher::builder()
            .with_url(format!("{}/config", server.url()))
            .with_auth_token("token123")
            .build()
            .unwrap();

        assert!(fetcher.fetch().await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_non_ok_status_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/config")
            .with_status(503)
            .with_body("{}")
            .create_async()
            .await;

        let fetcher = RemoteFetcher::new(format!("{}/config", server.url())).unwrap();
        let result = fetcher.fetch().await;

        match result {
            Err(ConfigError::Fetch { reason, .. }) => assert!(reason.contains("503")),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let fetcher = RemoteFetcher::builder()
            .with_url("http://127.0.0.1:9/config")
            .with_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let result = fetcher.fetch().await;
        assert!(matches!(result, Err(ConfigError::Fetch { .. })));
    }
}
