//! Reelwatch: a rotating-credential video search poller
//!
//! This crate periodically queries a video search API with a pool of rotating
//! API keys, normalizes the results into canonical records, stores them in
//! SQLite and serves them back through a small read-only HTTP API.

pub mod api;
pub mod config;
pub mod credentials;
pub mod fetcher;
pub mod ingest;
pub mod record;
pub mod storage;

use thiserror::Error;

/// Main error type for Reelwatch operations
#[derive(Debug, Error)]
pub enum ReelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use config::Config;
pub use credentials::{Credential, CredentialPool, CredentialState};
pub use fetcher::{FetchError, FetchOutcome, SearchClient, YouTubeClient};
pub use ingest::{CycleReport, IngestScheduler, SchedulerMode};
pub use record::CanonicalRecord;
pub use storage::{RecordStore, SqliteStore, WriteStrategy};
