//! HTTP client for the search API

use crate::config::YouTubeConfig;
use crate::credentials::Credential;
use crate::fetcher::response::{error_detail, is_quota_error, parse_search_response};
use crate::fetcher::{FetchError, FetchOutcome};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Page size requested from the search API
pub const MAX_RESULTS: u32 = 50;

/// Something that can run one search for a credential and query
///
/// Implementations hold no state across calls and never retry.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn fetch(&self, credential: &Credential, query: &str) -> FetchOutcome;
}

/// Builds an HTTP client with bounded timeouts
///
/// # Arguments
///
/// * `timeout` - Upper bound for the whole request
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("reelwatch/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// YouTube Data API v3 search client
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    search_url: String,
    timeout: Duration,
}

impl YouTubeClient {
    /// Creates a client from the API configuration
    pub fn new(config: &YouTubeConfig) -> Result<Self, reqwest::Error> {
        Self::with_base_url(&config.base_url, config.request_timeout())
    }

    /// Creates a client against an explicit API base URL
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(timeout)?,
            search_url: format!("{}/search", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    fn classify_send_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Network(format!("Request timed out after {:?}", self.timeout))
        } else if e.is_connect() {
            FetchError::Network("Connection failed".to_string())
        } else {
            // The URL carries the API key
            FetchError::Network(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl SearchClient for YouTubeClient {
    /// Runs one search request
    ///
    /// # Outcome mapping
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | 2xx with valid body | Success |
    /// | 429, or quota reason in error body | QuotaExceeded |
    /// | Other non-2xx | TransientError(Status) |
    /// | Timeout, connection failure | TransientError(Network) |
    /// | Malformed body | TransientError(Decode) |
    async fn fetch(&self, credential: &Credential, query: &str) -> FetchOutcome {
        let max_results = MAX_RESULTS.to_string();
        let request = self.client.get(&self.search_url).query(&[
            ("part", "snippet"),
            ("maxResults", max_results.as_str()),
            ("q", query),
            ("type", "video"),
            ("order", "date"),
            ("key", credential.expose()),
        ]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransientError(self.classify_send_error(e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return FetchOutcome::TransientError(self.classify_send_error(e)),
        };

        if !status.is_success() {
            if is_quota_error(status.as_u16(), &body) {
                return FetchOutcome::QuotaExceeded(credential.clone());
            }
            return FetchOutcome::TransientError(FetchError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        match parse_search_response(&body) {
            Ok(records) => FetchOutcome::Success(records),
            Err(e) => FetchOutcome::TransientError(e),
        }
    }
}
