//! Search API fetching
//!
//! This module performs one bounded search request per call and turns the
//! response into canonical records, including:
//! - Building the HTTP client with timeouts and a user agent
//! - Issuing the search request for a credential and query
//! - Classifying failures as quota exhaustion or transient errors
//! - Parsing and validating the returned items

mod client;
mod response;

pub use client::{build_http_client, SearchClient, YouTubeClient, MAX_RESULTS};
pub use response::{is_quota_error, parse_search_response};

use crate::credentials::Credential;
use crate::record::CanonicalRecord;
use thiserror::Error;

/// Failures that skip a cycle without affecting the credential
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Result of one fetch attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Records in the API's newest-first order; may be empty
    Success(Vec<CanonicalRecord>),

    /// The credential exhausted its quota
    QuotaExceeded(Credential),

    /// Network, status or decode failure
    TransientError(FetchError),
}
