use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const QUERY: &str = "golang tutorials";

/// One search result item in the API's wire shape
pub fn item(video_id: &str, title: &str, published_at: &str) -> Value {
    json!({
        "kind": "youtube#searchResult",
        "id": { "kind": "youtube#video", "videoId": video_id },
        "snippet": {
            "publishedAt": published_at,
            "title": title,
            "description": format!("{} description", title),
            "thumbnails": {
                "default": { "url": format!("https://i.ytimg.com/vi/{}/default.jpg", video_id) }
            }
        }
    })
}

pub fn search_body(items: Vec<Value>) -> Value {
    json!({ "kind": "youtube#searchListResponse", "items": items })
}

pub fn quota_body() -> Value {
    json!({
        "error": {
            "code": 403,
            "message": "The request cannot be completed because you have exceeded your quota.",
            "errors": [{
                "message": "The request cannot be completed because you have exceeded your quota.",
                "domain": "youtube.quota",
                "reason": "quotaExceeded"
            }]
        }
    })
}

/// Mounts a search response for one API key
pub async fn mount_for_key(server: &MockServer, key: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .and(query_param("key", key))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn base_url(server: &MockServer) -> String {
    format!("{}/youtube/v3", server.uri())
}
