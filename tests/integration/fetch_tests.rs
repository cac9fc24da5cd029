use crate::common::{base_url, item, mount_for_key, quota_body, search_body, QUERY};
use reelwatch::credentials::Credential;
use reelwatch::fetcher::{FetchError, FetchOutcome, SearchClient, YouTubeClient};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> YouTubeClient {
    YouTubeClient::with_base_url(&base_url(server), Duration::from_secs(5))
        .expect("Failed to build client")
}

#[tokio::test]
async fn test_request_carries_search_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .and(query_param("part", "snippet"))
        .and(query_param("maxResults", "50"))
        .and(query_param("q", QUERY))
        .and(query_param("type", "video"))
        .and(query_param("order", "date"))
        .and(query_param("key", "keyA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = client(&mock_server)
        .fetch(&Credential::from("keyA"), QUERY)
        .await;

    assert_eq!(outcome, FetchOutcome::Success(vec![]));
}

#[tokio::test]
async fn test_success_drops_malformed_dates() {
    let mock_server = MockServer::start().await;
    mount_for_key(
        &mock_server,
        "keyA",
        ResponseTemplate::new(200).set_body_json(search_body(vec![
            item("v3", "Golang generics", "2024-03-03T09:00:00Z"),
            item("v2", "Golang broken", "03/02/2024"),
            item("v1", "Golang basics", "2024-03-01T09:00:00Z"),
        ])),
    )
    .await;

    let outcome = client(&mock_server)
        .fetch(&Credential::from("keyA"), QUERY)
        .await;

    let FetchOutcome::Success(batch) = outcome else {
        panic!("expected success, got {:?}", outcome);
    };
    let titles: Vec<&str> = batch.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Golang generics", "Golang basics"]);
    assert_eq!(batch[0].video_id.as_deref(), Some("v3"));
    assert_eq!(
        batch[0].thumbnail_url,
        "https://i.ytimg.com/vi/v3/default.jpg"
    );
}

#[tokio::test]
async fn test_quota_exceeded_names_credential() {
    let mock_server = MockServer::start().await;
    mount_for_key(
        &mock_server,
        "keyA",
        ResponseTemplate::new(403).set_body_json(quota_body()),
    )
    .await;

    let outcome = client(&mock_server)
        .fetch(&Credential::from("keyA"), QUERY)
        .await;

    assert_eq!(outcome, FetchOutcome::QuotaExceeded(Credential::from("keyA")));
}

#[tokio::test]
async fn test_too_many_requests_is_quota() {
    let mock_server = MockServer::start().await;
    mount_for_key(&mock_server, "keyA", ResponseTemplate::new(429)).await;

    let outcome = client(&mock_server)
        .fetch(&Credential::from("keyA"), QUERY)
        .await;

    assert!(matches!(outcome, FetchOutcome::QuotaExceeded(_)));
}

#[tokio::test]
async fn test_other_errors_are_transient() {
    let mock_server = MockServer::start().await;
    mount_for_key(
        &mock_server,
        "forbidden",
        ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": { "code": 403, "message": "API key not valid.", "errors": [{ "reason": "forbidden" }] }
        })),
    )
    .await;
    mount_for_key(
        &mock_server,
        "broken",
        ResponseTemplate::new(503).set_body_string("upstream unavailable"),
    )
    .await;
    mount_for_key(
        &mock_server,
        "garbled",
        ResponseTemplate::new(200).set_body_string("<html>not json</html>"),
    )
    .await;

    let client = client(&mock_server);

    assert_eq!(
        client.fetch(&Credential::from("forbidden"), QUERY).await,
        FetchOutcome::TransientError(FetchError::Status {
            status: 403,
            detail: "API key not valid.".to_string()
        })
    );
    assert_eq!(
        client.fetch(&Credential::from("broken"), QUERY).await,
        FetchOutcome::TransientError(FetchError::Status {
            status: 503,
            detail: "upstream unavailable".to_string()
        })
    );
    assert!(matches!(
        client.fetch(&Credential::from("garbled"), QUERY).await,
        FetchOutcome::TransientError(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;
    mount_for_key(
        &mock_server,
        "keyA",
        ResponseTemplate::new(200)
            .set_body_json(search_body(vec![]))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let client = YouTubeClient::with_base_url(&base_url(&mock_server), Duration::from_millis(300))
        .expect("Failed to build client");
    let outcome = client.fetch(&Credential::from("keyA"), QUERY).await;

    match outcome {
        FetchOutcome::TransientError(FetchError::Network(message)) => {
            assert!(!message.contains("keyA"), "key leaked: {}", message);
        }
        other => panic!("expected network error, got {:?}", other),
    }
}
