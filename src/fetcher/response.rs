//! Wire types for the search API and their conversion into records

use crate::fetcher::FetchError;
use crate::record::CanonicalRecord;
use serde::Deserialize;

/// Error reasons that mean the credential's quota is used up
const QUOTA_REASONS: &[&str] = &[
    "quotaExceeded",
    "dailyLimitExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: Option<ItemId>,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    url: String,
}

impl Thumbnails {
    fn best_url(self) -> String {
        [self.default, self.medium, self.high]
            .into_iter()
            .flatten()
            .map(|t| t.url)
            .find(|url| !url.is_empty())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

/// Parses a search response body into records
///
/// Items without a snippet or title, or with an unparsable publish time, are
/// dropped and logged. Relative order of the kept items is preserved.
pub fn parse_search_response(body: &str) -> Result<Vec<CanonicalRecord>, FetchError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let total = response.items.len();
    let mut records = Vec::with_capacity(total);

    for (position, item) in response.items.into_iter().enumerate() {
        let Some(snippet) = item.snippet else {
            tracing::warn!("Dropping item {}: no snippet", position);
            continue;
        };
        let Some(title) = snippet.title else {
            tracing::warn!("Dropping item {}: no title", position);
            continue;
        };

        let video_id = item.id.and_then(|id| id.video_id);
        match CanonicalRecord::from_raw(
            title,
            snippet.description,
            &snippet.published_at,
            snippet.thumbnails.best_url(),
            video_id,
        ) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Dropping item {}: {}", position, e),
        }
    }

    if records.len() < total {
        tracing::debug!("Kept {} of {} items", records.len(), total);
    }

    Ok(records)
}

/// Decides whether a failed response means the credential is out of quota
///
/// HTTP 429 always counts. Otherwise the structured error reasons are
/// checked, falling back to a plain text match for unstructured bodies.
pub fn is_quota_error(status: u16, body: &str) -> bool {
    if status == 429 {
        return true;
    }

    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => envelope
            .error
            .errors
            .iter()
            .filter_map(|e| e.reason.as_deref())
            .any(|reason| QUOTA_REASONS.contains(&reason)),
        Err(_) => body.contains("quotaExceeded"),
    }
}

/// Extracts a short human readable detail from an error body
pub(crate) fn error_detail(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        if let Some(message) = envelope.error.message {
            return message;
        }
    }

    let trimmed = body.trim();
    if trimmed.chars().count() > 200 {
        let head: String = trimmed.chars().take(200).collect();
        format!("{}…", head)
    } else {
        trimmed.to_string()
    }
}
