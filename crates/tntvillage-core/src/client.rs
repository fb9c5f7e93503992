//! HTTP client with rate limiting for TNTVillage
//!
//! This module provides the page-fetching seam used by the provider and a
//! rate-limited reqwest implementation that retries transient errors with
//! exponential backoff.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Result, TntError};

/// Default User-Agent mimicking a modern browser
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default Accept-Language header for Italian content
const DEFAULT_ACCEPT_LANGUAGE: &str = "it-IT,it;q=0.9,en;q=0.8";

/// Maximum number of retry attempts for transient errors
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Source of release list pages.
///
/// A failed or empty response is reported as `None`, never as an error:
/// the provider treats it as "no results for this page".
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, form: &[(&'static str, String)]) -> Option<String>;
}

/// Rate limiter to control request frequency
///
/// Ensures that requests are spaced at least `min_interval` apart
/// to avoid overwhelming the site.
pub struct RateLimiter {
    /// Minimum interval between requests
    min_interval: Duration,
    /// Timestamp of the last request
    last_request: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per second
    ///
    /// # Example
    /// ```
    /// use tntvillage_core::client::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2.0); // 2 requests per second
    /// ```
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = Duration::from_secs_f64(1.0 / requests_per_second);
        let now = Instant::now();
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(now.checked_sub(min_interval).unwrap_or(now))),
        }
    }

    /// Acquire permission to make a request
    ///
    /// This method will wait if necessary to ensure the minimum interval
    /// between requests is respected.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.min_interval {
            let wait_time = self.min_interval - elapsed;
            sleep(wait_time).await;
        }

        *last = Instant::now();
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Configuration for the TNTVillage HTTP client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum requests per second (default: 1.0)
    pub requests_per_second: f64,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1.0,
            timeout_secs: 30,
        }
    }
}

/// HTTP client for TNTVillage with rate limiting and retry logic
///
/// This client automatically:
/// - Limits request rate to avoid server overload
/// - Retries on transient errors (429, 5xx) with exponential backoff
/// - Sets appropriate headers for Italian content
pub struct TntClient {
    /// Underlying HTTP client
    client: reqwest::Client,
    /// Rate limiter for request throttling
    rate_limiter: RateLimiter,
}

impl TntClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));

        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let rate_limiter = RateLimiter::new(config.requests_per_second);

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// POST a form-encoded body and return the response text
    ///
    /// This method handles rate limiting and retries automatically.
    ///
    /// # Errors
    /// - `TntError::InvalidUrl` - The URL cannot be parsed
    /// - `TntError::HttpError` - Network error after all retries
    /// - `TntError::RateLimited` - Server returned 429 after all retries
    /// - `TntError::NotFound` - Server returned 404
    /// - `TntError::HttpStatus` - Any other non-success status
    pub async fn post_form(&self, url: &str, form: &[(&'static str, String)]) -> Result<String> {
        reqwest::Url::parse(url).map_err(|e| TntError::InvalidUrl(format!("{}: {}", url, e)))?;
        self.post_with_retry(url, form, 0).await
    }

    /// Internal method to post with retry logic
    fn post_with_retry<'a>(
        &'a self,
        url: &'a str,
        form: &'a [(&'static str, String)],
        attempt: u32,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            // Wait for rate limiter before making request
            self.rate_limiter.acquire().await;

            let response = self.client.post(url).form(form).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response.text().await?);
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(TntError::NotFound(url.to_string()));
            }

            let transient =
                status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();

            if transient && attempt < MAX_RETRIES {
                let delay = self.calculate_backoff_delay(attempt);
                debug!(status = status.as_u16(), attempt, ?delay, "Retrying request");
                sleep(delay).await;
                return self.post_with_retry(url, form, attempt + 1).await;
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(TntError::RateLimited);
            }

            Err(TntError::HttpStatus(status.as_u16()))
        })
    }

    /// Calculate exponential backoff delay for retry
    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        // Exponential backoff: 1s, 2s, 4s, ...
        let delay_ms = BASE_RETRY_DELAY_MS * 2u64.pow(attempt);
        Duration::from_millis(delay_ms)
    }

    /// Get a reference to the rate limiter (for testing)
    #[cfg(test)]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

#[async_trait]
impl PageFetcher for TntClient {
    async fn fetch(&self, url: &str, form: &[(&'static str, String)]) -> Option<String> {
        match self.post_form(url, form).await {
            Ok(body) if body.trim().is_empty() => {
                debug!(url = url, "Empty response body");
                None
            }
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url = url, error = %e, "Request failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client() -> TntClient {
        TntClient::with_config(ClientConfig {
            requests_per_second: 100.0,
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn form() -> Vec<(&'static str, String)> {
        vec![
            ("srcrel", "Show S01".to_string()),
            ("cat", "29".to_string()),
            ("page", "1".to_string()),
        ]
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(2.0);
        assert_eq!(limiter.min_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_rate_limiter_different_rates() {
        let limiter = RateLimiter::new(1.0);
        assert_eq!(limiter.min_interval(), Duration::from_secs(1));

        let limiter = RateLimiter::new(4.0);
        assert_eq!(limiter.min_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.requests_per_second, 1.0);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_client_creation() {
        let client = TntClient::new();
        assert!(client.is_ok());
        assert_eq!(client.unwrap().rate_limiter().min_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_delay_calculation() {
        let client = TntClient::new().unwrap();

        assert_eq!(client.calculate_backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(client.calculate_backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(client.calculate_backoff_delay(2), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire() {
        let limiter = RateLimiter::new(10.0); // 10 requests per second = 100ms interval

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let elapsed = start.elapsed();

        // Second acquire should wait at least 100ms
        assert!(elapsed >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_post_form_sends_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/src/releaselist.php"))
            .and(body_string_contains("srcrel=Show+S01"))
            .and(body_string_contains("cat=29"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/src/releaselist.php", server.uri());
        let body = fast_client().post_form(&url, &form()).await.unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_post_form_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let result = fast_client().post_form(&url, &form()).await;
        assert!(matches!(result, Err(TntError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_post_form_client_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/forbidden", server.uri());
        let result = fast_client().post_form(&url, &form()).await;
        assert!(matches!(result, Err(TntError::HttpStatus(403))));
    }

    #[tokio::test]
    async fn test_post_form_invalid_url() {
        let result = fast_client().post_form("not a url", &form()).await;
        assert!(matches!(result, Err(TntError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_maps_failures_to_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_string("   "))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = fast_client();
        let empty = client.fetch(&format!("{}/empty", server.uri()), &form()).await;
        let gone = client.fetch(&format!("{}/gone", server.uri()), &form()).await;

        assert_eq!(empty, None);
        assert_eq!(gone, None);
    }
}
