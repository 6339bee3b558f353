//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable per-request timeout and User-Agent
//! - Exponential backoff retry logic on timeouts, 429 and 5xx responses
//! - JSON GET and POST helpers with registry error context

use crate::error::RegistryError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("catup/", env!("CARGO_PKG_VERSION"));

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// Registry name used in error messages
const REGISTRY_NAME: &str = "npm";

/// Backoff before retry `attempt` (0-based), saturating instead of overflowing
fn backoff_delay_ms(attempt: u32) -> u64 {
    2u64.checked_pow(attempt)
        .map_or(u64::MAX, |factor| BASE_DELAY_MS.saturating_mul(factor))
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                RegistryError::network_error(
                    "",
                    "HTTP client",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            timeout,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Create a client with the given timeout and the default User-Agent
    pub fn with_timeout(timeout: Duration) -> Result<Self, RegistryError> {
        Self::with_config(timeout, DEFAULT_USER_AGENT)
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Upper bound on the time one call may take, retries and backoff included
    pub fn call_budget(&self) -> Duration {
        let attempts = self.max_retries.saturating_add(1);
        let backoff = (0..self.max_retries).fold(0u64, |total, i| {
            total.saturating_add(backoff_delay_ms(i))
        });
        self.timeout
            .saturating_mul(attempts)
            .saturating_add(Duration::from_millis(backoff))
    }

    /// Send a request built by `build`, retrying with exponential backoff
    async fn send_with_retry<F>(
        &self,
        build: F,
        package: &str,
    ) -> Result<reqwest::Response, RegistryError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            let error = match build(&self.client).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NOT_FOUND {
                        return Err(RegistryError::package_not_found(package, REGISTRY_NAME));
                    }

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        RegistryError::rate_limit_exceeded(REGISTRY_NAME)
                    } else if status.is_server_error() {
                        RegistryError::network_error(
                            package,
                            REGISTRY_NAME,
                            format!("HTTP {}", status),
                        )
                    } else {
                        // other client errors will not improve on retry
                        return Err(RegistryError::network_error(
                            package,
                            REGISTRY_NAME,
                            format!("HTTP {}", status),
                        ));
                    }
                }
                Err(e) if e.is_timeout() => RegistryError::timeout(package, REGISTRY_NAME),
                Err(e) => RegistryError::network_error(package, REGISTRY_NAME, e.to_string()),
            };

            if attempt < self.max_retries {
                let delay = backoff_delay_ms(attempt);
                log::debug!(
                    "retrying {} in {}ms (attempt {}/{}): {}",
                    package,
                    delay,
                    attempt + 1,
                    self.max_retries,
                    error
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| {
            RegistryError::network_error(package, REGISTRY_NAME, "unknown error")
        }))
    }

    async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
        package: &str,
    ) -> Result<T, RegistryError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RegistryError::InvalidResponse {
                package: package.to_string(),
                registry: REGISTRY_NAME.to_string(),
                message: format!("failed to parse JSON: {}", e),
            })
    }

    /// Perform a GET request with an Accept header and parse the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        accept: &str,
        package: &str,
    ) -> Result<T, RegistryError> {
        let response = self
            .send_with_retry(
                |client| client.get(url).header(reqwest::header::ACCEPT, accept),
                package,
            )
            .await?;
        Self::parse_json(response, package).await
    }

    /// Perform a POST request with a JSON body and parse the JSON response
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        package: &str,
    ) -> Result<T, RegistryError> {
        let response = self
            .send_with_retry(|client| client.post(url).json(body), package)
            .await?;
        Self::parse_json(response, package).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_http_client_with_config() {
        let client = HttpClient::with_config(Duration::from_secs(60), "test-agent/1.0").unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_http_client_with_max_retries() {
        let client = HttpClient::new().unwrap().with_max_retries(5);
        assert_eq!(client.max_retries(), 5);
    }

    #[test]
    fn test_call_budget() {
        let client = HttpClient::with_timeout(Duration::from_secs(2))
            .unwrap()
            .with_max_retries(2);
        // two retries: 3 attempts plus 100ms + 200ms of backoff
        assert_eq!(client.call_budget(), Duration::from_millis(6_300));
    }

    #[test]
    fn test_backoff_delay_doubles() {
        assert_eq!(backoff_delay_ms(0), 100);
        assert_eq!(backoff_delay_ms(1), 200);
        assert_eq!(backoff_delay_ms(3), 800);
        assert_eq!(backoff_delay_ms(64), u64::MAX);
    }

    #[test]
    fn test_call_budget_saturates_on_large_settings() {
        let client = HttpClient::with_timeout(Duration::from_secs(30))
            .unwrap()
            .with_max_retries(64);
        assert!(client.call_budget() > Duration::from_secs(30 * 65));

        let client = HttpClient::with_timeout(Duration::from_secs(u64::MAX / 2))
            .unwrap()
            .with_max_retries(3);
        assert_eq!(client.call_budget(), Duration::MAX);

        let client = HttpClient::new().unwrap().with_max_retries(u32::MAX);
        assert_eq!(client.call_budget(), Duration::MAX);
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert!(DEFAULT_USER_AGENT.starts_with("catup/"));
        assert_eq!(DEFAULT_MAX_RETRIES, 3);
        assert_eq!(BASE_DELAY_MS, 100);
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_network_error() {
        // port 9 on localhost is discard; nothing listens there in test sandboxes
        let client = HttpClient::with_timeout(Duration::from_millis(200))
            .unwrap()
            .with_max_retries(0);
        let result: Result<serde_json::Value, _> = client
            .get_json("http://127.0.0.1:9/react", "application/json", "react")
            .await;
        assert!(matches!(
            result,
            Err(RegistryError::NetworkError { .. }) | Err(RegistryError::Timeout { .. })
        ));
    }
}
