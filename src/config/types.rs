use crate::ingest::SchedulerMode;
use crate::storage::WriteStrategy;
use serde::Deserialize;
use std::time::Duration;

/// Default endpoint of the YouTube Data API v3
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Main configuration structure for Reelwatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Read API listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "127.0.0.1:8080"
    pub listen: String,
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// How batches are written: raw append or deduplicating upsert
    #[serde(default)]
    pub strategy: WriteStrategy,
}

/// External search API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeConfig {
    /// API keys, used in round-robin order
    #[serde(rename = "api-keys")]
    pub api_keys: Vec<String>,

    /// Free-text search query
    #[serde(rename = "search-query")]
    pub search_query: String,

    /// Seconds between fetch cycles
    #[serde(rename = "fetch-interval-seconds")]
    pub fetch_interval_seconds: u64,

    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Upper bound for a single search request
    #[serde(rename = "request-timeout-seconds", default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// How long a credential stays suspended after a quota error
    #[serde(rename = "quota-backoff-hours", default = "default_quota_backoff")]
    pub quota_backoff_hours: u64,
}

impl YouTubeConfig {
    /// Returns the fetch interval as a Duration
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn quota_backoff(&self) -> Duration {
        Duration::from_secs(self.quota_backoff_hours.saturating_mul(60 * 60))
    }
}

/// Ingestion scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub mode: SchedulerMode,

    /// Time in-flight cycles get to finish once shutdown is requested
    #[serde(rename = "shutdown-grace-seconds", default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl SchedulerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mode: SchedulerMode::default(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_quota_backoff() -> u64 {
    24
}

fn default_shutdown_grace() -> u64 {
    10
}
