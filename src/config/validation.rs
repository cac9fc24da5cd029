use crate::config::types::{Config, SchedulerConfig, ServerConfig, StorageConfig, YouTubeConfig};
use crate::ConfigError;
use std::collections::HashSet;
use std::net::SocketAddr;
use url::Url;

/// One week
const MAX_QUOTA_BACKOFF_HOURS: u64 = 168;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_storage_config(&config.storage)?;
    validate_youtube_config(&config.youtube)?;
    validate_scheduler_config(&config.scheduler)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.listen.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!("Invalid listen address '{}': {}", config.listen, e))
    })?;
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the search API configuration
fn validate_youtube_config(config: &YouTubeConfig) -> Result<(), ConfigError> {
    if config.api_keys.is_empty() {
        return Err(ConfigError::Validation(
            "api-keys must contain at least one key".to_string(),
        ));
    }

    if let Some(index) = config.api_keys.iter().position(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "api-keys entry {} is blank",
            index
        )));
    }

    let mut seen = HashSet::new();
    if let Some(index) = config.api_keys.iter().position(|k| !seen.insert(k.trim())) {
        return Err(ConfigError::Validation(format!(
            "api-keys entry {} repeats an earlier key",
            index
        )));
    }

    if config.search_query.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search-query cannot be empty".to_string(),
        ));
    }

    if config.fetch_interval_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch-interval-seconds must be >= 1, got {}",
            config.fetch_interval_seconds
        )));
    }

    if !(1..=120).contains(&config.request_timeout_seconds) {
        return Err(ConfigError::Validation(format!(
            "request-timeout-seconds must be between 1 and 120, got {}",
            config.request_timeout_seconds
        )));
    }

    if !(1..=MAX_QUOTA_BACKOFF_HOURS).contains(&config.quota_backoff_hours) {
        return Err(ConfigError::Validation(format!(
            "quota-backoff-hours must be between 1 and {}, got {}",
            MAX_QUOTA_BACKOFF_HOURS,
            config.quota_backoff_hours
        )));
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    Ok(())
}

fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.shutdown_grace_seconds > 300 {
        return Err(ConfigError::Validation(format!(
            "shutdown-grace-seconds must be <= 300, got {}",
            config.shutdown_grace_seconds
        )));
    }
    Ok(())
}
