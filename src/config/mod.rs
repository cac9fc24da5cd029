//! Configuration module for Reelwatch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use reelwatch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("reelwatch.toml")).unwrap();
//! println!("Polling every {}s", config.youtube.fetch_interval_seconds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, SchedulerConfig, ServerConfig, StorageConfig, YouTubeConfig, DEFAULT_BASE_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
