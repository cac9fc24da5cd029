//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::record::{parse_timestamp, CanonicalRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::WriteStrategy;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SELECT_COLUMNS: &str =
    "SELECT id, title, description, published_at, thumbnail_url, video_id FROM videos";

/// SQLite record store
///
/// The connection sits behind a mutex; each batch is one transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    strategy: WriteStrategy,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `strategy` - How batches are written
    pub fn new(path: &Path, strategy: WriteStrategy) -> StorageResult<Self> {
        let conn = init_database(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            strategy,
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory(strategy: WriteStrategy) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            strategy,
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection mutex poisoned".to_string()))
    }

    fn query_records(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> StorageResult<Vec<CanonicalRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, title, description, published_at, thumbnail_url, video_id)| {
                    let published_at = parse_timestamp(&published_at).map_err(|e| {
                        StorageError::CorruptRow {
                            id,
                            message: e.to_string(),
                        }
                    })?;
                    Ok(CanonicalRecord {
                        title,
                        description,
                        published_at,
                        thumbnail_url,
                        video_id,
                    })
                },
            )
            .collect()
    }
}

/// Fixed-width UTC text so that string order equals time order
fn storage_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Escapes LIKE wildcards in a user supplied term
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Case-folded text for search; SQLite's own LIKE only folds ASCII
fn fold(text: &str) -> String {
    text.to_lowercase()
}

fn insert_record(tx: &Transaction<'_>, record: &CanonicalRecord, now: &str) -> StorageResult<()> {
    tx.execute(
        "INSERT INTO videos
            (title, description, published_at, thumbnail_url, video_id, dedup_key, ingested_at,
             title_folded, description_folded)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.title,
            record.description,
            storage_timestamp(&record.published_at),
            record.thumbnail_url,
            record.video_id,
            record.dedup_key(),
            now,
            fold(&record.title),
            fold(&record.description),
        ],
    )?;
    Ok(())
}

/// Inserts the record unless its key exists; returns true if inserted
fn upsert_record(tx: &Transaction<'_>, record: &CanonicalRecord, now: &str) -> StorageResult<bool> {
    let key = record.dedup_key();
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM videos WHERE dedup_key = ?1 ORDER BY id LIMIT 1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            tx.execute(
                "UPDATE videos
                 SET title = ?1, description = ?2, published_at = ?3, thumbnail_url = ?4,
                     title_folded = ?5, description_folded = ?6
                 WHERE id = ?7",
                params![
                    record.title,
                    record.description,
                    storage_timestamp(&record.published_at),
                    record.thumbnail_url,
                    fold(&record.title),
                    fold(&record.description),
                    id,
                ],
            )?;
            Ok(false)
        }
        None => {
            insert_record(tx, record, now)?;
            Ok(true)
        }
    }
}

impl RecordStore for SqliteStore {
    fn append(&self, batch: &[CanonicalRecord]) -> StorageResult<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        let mut inserted = 0;
        for record in batch {
            match self.strategy {
                WriteStrategy::Append => {
                    insert_record(&tx, record, &now)?;
                    inserted += 1;
                }
                WriteStrategy::Upsert => {
                    if upsert_record(&tx, record, &now)? {
                        inserted += 1;
                    }
                }
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn list_recent(&self) -> StorageResult<Vec<CanonicalRecord>> {
        let sql = format!("{} ORDER BY published_at DESC, id ASC", SELECT_COLUMNS);
        self.query_records(&sql, &[])
    }

    fn search(&self, term: &str) -> StorageResult<Vec<CanonicalRecord>> {
        let sql = format!(
            "{} WHERE title_folded LIKE ?1 ESCAPE '\\' OR description_folded LIKE ?1 ESCAPE '\\'
             ORDER BY published_at DESC, id ASC",
            SELECT_COLUMNS
        );
        let pattern = like_pattern(&fold(term));
        self.query_records(&sql, &[&pattern])
    }

    fn count(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
