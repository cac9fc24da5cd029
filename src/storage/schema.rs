//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Reelwatch database.

/// SQL schema for the database
///
/// `dedup_key` is indexed but not unique: the append strategy keeps duplicates.
/// The `*_folded` columns hold lowercased copies used by substring search.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS videos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    published_at TEXT NOT NULL,
    thumbnail_url TEXT NOT NULL DEFAULT '',
    title_folded TEXT NOT NULL DEFAULT '',
    description_folded TEXT NOT NULL DEFAULT '',
    video_id TEXT,
    dedup_key TEXT NOT NULL,
    ingested_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_videos_published_at ON videos(published_at);
CREATE INDEX IF NOT EXISTS idx_videos_dedup_key ON videos(dedup_key);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
