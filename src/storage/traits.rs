//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::record::CanonicalRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt row {id}: {message}")]
    CorruptRow { id: i64, message: String },

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Sink for ingested batches and source for the read API
///
/// Implementations must be safe to share between the scheduler and request
/// handlers. Methods block; async callers should run them off the runtime
/// threads.
pub trait RecordStore: Send + Sync {
    /// Writes a batch atomically
    ///
    /// An empty batch is a successful no-op. Readers never observe a
    /// partially written batch. Failures are reported, not retried.
    ///
    /// # Returns
    ///
    /// The number of rows inserted
    fn append(&self, batch: &[CanonicalRecord]) -> StorageResult<usize>;

    /// Returns every record, newest publish time first
    fn list_recent(&self) -> StorageResult<Vec<CanonicalRecord>>;

    /// Returns records whose title or description contains `term`
    ///
    /// Matching is case-insensitive; results are newest first.
    fn search(&self, term: &str) -> StorageResult<Vec<CanonicalRecord>>;

    /// Counts stored records
    fn count(&self) -> StorageResult<u64>;
}
