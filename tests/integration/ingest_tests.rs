use crate::common::{base_url, item, mount_for_key, quota_body, search_body, QUERY};
use reelwatch::credentials::CredentialPool;
use reelwatch::fetcher::YouTubeClient;
use reelwatch::ingest::{CycleReport, IngestScheduler, SchedulerMode, SchedulerSettings};
use reelwatch::storage::{RecordStore, SqliteStore, WriteStrategy};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{MockServer, ResponseTemplate};

fn settings() -> SchedulerSettings {
    SchedulerSettings {
        query: QUERY.to_string(),
        interval: Duration::from_secs(60),
        quota_backoff: Duration::from_secs(24 * 60 * 60),
        mode: SchedulerMode::Rotating,
        shutdown_grace: Duration::from_secs(1),
    }
}

fn scheduler(
    server: &MockServer,
    keys: &[&str],
    store: Arc<SqliteStore>,
) -> IngestScheduler {
    let pool = CredentialPool::new(keys.iter().copied()).expect("Failed to build pool");
    let client = YouTubeClient::with_base_url(&base_url(server), Duration::from_secs(5))
        .expect("Failed to build client");
    IngestScheduler::new(Arc::new(pool), Arc::new(client), store, settings())
}

fn temp_store(dir: &tempfile::TempDir, strategy: WriteStrategy) -> Arc<SqliteStore> {
    Arc::new(
        SqliteStore::new(&dir.path().join("videos.db"), strategy)
            .expect("Failed to open store"),
    )
}

#[tokio::test]
async fn test_two_tick_rotation_scenario() {
    let mock_server = MockServer::start().await;
    mount_for_key(
        &mock_server,
        "keyA",
        ResponseTemplate::new(200).set_body_json(search_body(vec![
            item("v3", "Golang generics deep dive", "2024-03-03T09:00:00Z"),
            item("v2", "Golang with a bad date", "not-a-timestamp"),
            item("v1", "Intro to golang", "2024-03-01T09:00:00Z"),
        ])),
    )
    .await;
    mount_for_key(
        &mock_server,
        "keyB",
        ResponseTemplate::new(200).set_body_json(search_body(vec![])),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir, WriteStrategy::Append);
    let sched = scheduler(&mock_server, &["keyA", "keyB"], store.clone());

    let first = sched.tick().await;
    assert_eq!(
        first,
        CycleReport::Stored {
            credential: "keyA".into(),
            fetched: 2,
            inserted: 2
        }
    );

    let second = sched.tick().await;
    assert_eq!(
        second,
        CycleReport::Empty {
            credential: "keyB".into()
        }
    );
    assert_eq!(store.count().unwrap(), 2);

    let hits = store.search("golang").unwrap();
    let titles: Vec<&str> = hits.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Golang generics deep dive", "Intro to golang"]);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_quota_on_first_key_moves_to_second() {
    let mock_server = MockServer::start().await;
    mount_for_key(
        &mock_server,
        "keyA",
        ResponseTemplate::new(403).set_body_json(quota_body()),
    )
    .await;
    mount_for_key(
        &mock_server,
        "keyB",
        ResponseTemplate::new(200).set_body_json(search_body(vec![item(
            "v9",
            "Golang testing",
            "2024-03-04T09:00:00Z",
        )])),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir, WriteStrategy::Append);
    let sched = scheduler(&mock_server, &["keyA", "keyB"], store.clone());

    let first = sched.tick().await;
    assert!(
        matches!(&first, CycleReport::Suspended { credential, .. } if credential.expose() == "keyA"),
        "got {:?}",
        first
    );

    let second = sched.tick().await;
    assert_eq!(second.credential().map(|c| c.expose()), Some("keyB"));
    assert_eq!(second.inserted(), 1);

    // keyA stays parked; keyB keeps being used
    let third = sched.tick().await;
    assert_eq!(third.credential().map(|c| c.expose()), Some("keyB"));

    let requests = mock_server.received_requests().await.unwrap();
    let keys: Vec<String> = requests
        .iter()
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "key")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert_eq!(keys, vec!["keyA", "keyB", "keyB"]);
}

#[tokio::test]
async fn test_upsert_strategy_deduplicates_repeated_results() {
    let mock_server = MockServer::start().await;
    let body = search_body(vec![
        item("v2", "Golang errors", "2024-03-02T09:00:00Z"),
        item("v1", "Golang modules", "2024-03-01T09:00:00Z"),
    ]);
    for key in ["keyA", "keyB"] {
        mount_for_key(
            &mock_server,
            key,
            ResponseTemplate::new(200).set_body_json(body.clone()),
        )
        .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir, WriteStrategy::Upsert);
    let sched = scheduler(&mock_server, &["keyA", "keyB"], store.clone());

    assert_eq!(sched.tick().await.inserted(), 2);
    assert_eq!(
        sched.tick().await,
        CycleReport::Stored {
            credential: "keyB".into(),
            fetched: 2,
            inserted: 0
        }
    );
    assert_eq!(store.count().unwrap(), 2);
}

#[tokio::test]
async fn test_append_strategy_keeps_repeated_results() {
    let mock_server = MockServer::start().await;
    mount_for_key(
        &mock_server,
        "keyA",
        ResponseTemplate::new(200).set_body_json(search_body(vec![item(
            "v1",
            "Golang modules",
            "2024-03-01T09:00:00Z",
        )])),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir, WriteStrategy::Append);
    let sched = scheduler(&mock_server, &["keyA"], store.clone());

    sched.tick().await;
    sched.tick().await;
    assert_eq!(store.count().unwrap(), 2);
}

#[tokio::test]
async fn test_server_error_skips_cycle_without_suspending() {
    let mock_server = MockServer::start().await;
    mount_for_key(&mock_server, "keyA", ResponseTemplate::new(500)).await;

    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir, WriteStrategy::Append);
    let sched = scheduler(&mock_server, &["keyA"], store.clone());

    assert!(matches!(sched.tick().await, CycleReport::Skipped { .. }));
    assert!(matches!(sched.tick().await, CycleReport::Skipped { .. }));
    assert_eq!(store.count().unwrap(), 0);
}
