//! Read-only HTTP API over the record store
//!
//! - `GET /videos` lists every record, newest first
//! - `GET /search?q=term` matches title or description
//! - `GET /health` liveness probe
//!
//! Ingestion errors never surface here; readers only see committed batches.

use crate::record::CanonicalRecord;
use crate::storage::{RecordStore, StorageError};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
}

/// Builds the read API router
pub fn router(store: Arc<dyn RecordStore>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/videos", get(list_videos))
        .route("/search", get(search_videos))
        .with_state(AppState { store })
}

/// Serves the router until `shutdown` is cancelled
pub async fn serve(
    listener: TcpListener,
    store: Arc<dyn RecordStore>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Read API listening on {}", addr);
    }

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

#[derive(Debug)]
enum ApiError {
    MissingQuery,
    Store(String),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Store(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingQuery => (
                StatusCode::BAD_REQUEST,
                "query parameter 'q' is required".to_string(),
            ),
            Self::Store(e) => {
                tracing::error!("Read query failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to read videos".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

/// Runs a blocking store query off the async workers
async fn read<F>(state: &AppState, query: F) -> Result<Vec<CanonicalRecord>, ApiError>
where
    F: FnOnce(&dyn RecordStore) -> Result<Vec<CanonicalRecord>, StorageError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || query(store.as_ref()))
        .await
        .map_err(|e| ApiError::Store(e.to_string()))?
        .map_err(ApiError::from)
}

async fn list_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<CanonicalRecord>>, ApiError> {
    let records = read(&state, |store| store.list_recent()).await?;
    Ok(Json(records))
}

async fn search_videos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<CanonicalRecord>>, ApiError> {
    let term = params
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::MissingQuery)?;

    let records = read(&state, move |store| store.search(&term)).await?;
    Ok(Json(records))
}
