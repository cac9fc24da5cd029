//! Canonical record shape for ingested videos
//!
//! Every search result is normalized into a [`CanonicalRecord`] before it is
//! handed to storage. Records whose publish timestamp cannot be parsed are
//! rejected here with a [`RecordError`] and dropped by the caller.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Per-record validation failures
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid publish timestamp '{raw}': {source}")]
    InvalidTimestamp {
        raw: String,
        source: chrono::ParseError,
    },
}

/// A normalized video search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub title: String,

    /// May be empty
    pub description: String,

    pub published_at: DateTime<Utc>,

    /// May be empty
    pub thumbnail_url: String,

    /// External video identifier, when the API supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl CanonicalRecord {
    /// Builds a record from raw API fields, parsing the RFC 3339 timestamp
    ///
    /// Offsets other than UTC are accepted and converted.
    pub fn from_raw(
        title: String,
        description: String,
        published_at: &str,
        thumbnail_url: String,
        video_id: Option<String>,
    ) -> Result<Self, RecordError> {
        let published_at = parse_timestamp(published_at)?;
        Ok(Self {
            title,
            description,
            published_at,
            thumbnail_url,
            video_id: video_id.filter(|id| !id.is_empty()),
        })
    }

    /// Returns the idempotency key used by the deduplicating store
    ///
    /// The external video id wins when present; otherwise the key is a
    /// SHA-256 over title and publish time.
    pub fn dedup_key(&self) -> String {
        if let Some(id) = &self.video_id {
            return format!("id:{}", id);
        }

        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.published_at_rfc3339().as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    /// Canonical text form of the publish time, as stored in the database
    pub fn published_at_rfc3339(&self) -> String {
        self.published_at
            .to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// Parses an RFC 3339 timestamp into UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RecordError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| RecordError::InvalidTimestamp {
            raw: raw.to_string(),
            source,
        })
}
