use crate::common::{base_url, item, mount_for_key, search_body, QUERY};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use reelwatch::api;
use reelwatch::credentials::CredentialPool;
use reelwatch::fetcher::YouTubeClient;
use reelwatch::ingest::{IngestScheduler, SchedulerMode, SchedulerSettings};
use reelwatch::storage::{RecordStore, SqliteStore, WriteStrategy};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt as _;
use wiremock::{MockServer, ResponseTemplate};

const BODY_LIMIT: usize = 1024 * 1024;

async fn get_json(store: Arc<dyn RecordStore>, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = api::router(store).oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn test_ingested_records_round_trip_through_api() {
    let mock_server = MockServer::start().await;
    mount_for_key(
        &mock_server,
        "keyA",
        ResponseTemplate::new(200).set_body_json(search_body(vec![
            item("v2", "Golang «concurrency» - part 2", "2024-03-02T09:15:30.250Z"),
            item("v1", "Golang part 1", "2024-03-01T09:00:00Z"),
            item("v3", "Golang part 3", "2024-03-03T09:00:00Z"),
        ])),
    )
    .await;

    let store: Arc<dyn RecordStore> =
        Arc::new(SqliteStore::new_in_memory(WriteStrategy::Append).unwrap());
    let pool = CredentialPool::new(["keyA"]).unwrap();
    let client =
        YouTubeClient::with_base_url(&base_url(&mock_server), Duration::from_secs(5)).unwrap();
    let sched = IngestScheduler::new(
        Arc::new(pool),
        Arc::new(client),
        Arc::clone(&store),
        SchedulerSettings {
            query: QUERY.to_string(),
            interval: Duration::from_secs(60),
            quota_backoff: Duration::from_secs(3600),
            mode: SchedulerMode::Rotating,
            shutdown_grace: Duration::from_secs(1),
        },
    );
    assert_eq!(sched.tick().await.inserted(), 3);

    let (status, body) = get_json(Arc::clone(&store), "/videos").await;
    assert_eq!(status, StatusCode::OK);

    let videos = body.as_array().unwrap();
    let published: Vec<&str> = videos
        .iter()
        .map(|v| v["published_at"].as_str().unwrap())
        .collect();
    assert_eq!(
        published,
        vec![
            "2024-03-03T09:00:00Z",
            "2024-03-02T09:15:30.250Z",
            "2024-03-01T09:00:00Z"
        ]
    );

    let v2 = &videos[1];
    assert_eq!(v2["title"], "Golang «concurrency» - part 2");
    assert_eq!(v2["description"], "Golang «concurrency» - part 2 description");
    assert_eq!(v2["thumbnail_url"], "https://i.ytimg.com/vi/v2/default.jpg");
    assert_eq!(v2["video_id"], "v2");

    let (status, body) = get_json(Arc::clone(&store), "/search?q=CONCURRENCY").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = get_json(store, "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
