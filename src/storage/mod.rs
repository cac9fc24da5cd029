//! Storage module for persisting ingested records
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Atomic batch writes, raw or deduplicating
//! - Newest-first listing and substring search for the read API

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStore};
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::ReelError;
use serde::Deserialize;
use std::path::Path;

/// Initializes or opens a record store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
/// * `strategy` - How batches are written
pub fn open_store(path: &Path, strategy: WriteStrategy) -> Result<SqliteStore, ReelError> {
    Ok(SqliteStore::new(path, strategy)?)
}

/// How a batch is written to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteStrategy {
    /// Insert every record, duplicates included
    #[default]
    Append,

    /// Insert records whose idempotency key is new; refresh the rest
    Upsert,
}

impl WriteStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Upsert => "upsert",
        }
    }
}
