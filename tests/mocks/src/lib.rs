//! Shared fixtures for tests that talk to a mock gallery API.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};

pub use wiremock::matchers;
pub use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Start a new wiremock server for API tests.
pub async fn start_mock_server() -> MockServer {
    MockServer::start().await
}

/// Asset payload as the server returns it.
pub fn asset(album_id: &str, id: &str) -> Value {
    json!({
        "id": id,
        "file_path": format!("media/albums/{}/{}.jpg", album_id, id),
        "thumb_path": null
    })
}

/// Public album with one asset per id.
pub fn public_album(id: &str, title: &str, asset_ids: &[&str]) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "public album",
        "is_protected": false,
        "assets": asset_ids.iter().map(|a| asset(id, a)).collect::<Vec<_>>()
    })
}

/// Protected album placeholder: the server withholds assets until unlock.
pub fn protected_album(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "protected album",
        "is_protected": true,
        "assets": []
    })
}

/// Successful unlock payload.
pub fn unlocked_album(id: &str, title: &str, asset_ids: &[&str]) -> Value {
    json!({
        "unlocked": true,
        "id": id,
        "title": title,
        "description": "protected album",
        "assets": asset_ids.iter().map(|a| asset(id, a)).collect::<Vec<_>>()
    })
}

/// Album list entry.
pub fn summary(id: &str, title: &str, order: i64, published: bool) -> Value {
    json!({
        "id": id,
        "title": title,
        "cover_image": null,
        "is_protected": false,
        "is_published": published,
        "display_order": order
    })
}

/// Mount `GET /api/albums/{id}` returning `body`.
pub async fn mount_album(server: &MockServer, id: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/albums/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount `GET /api/albums` returning the given summaries.
pub async fn mount_album_list(server: &MockServer, albums: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(albums)))
        .mount(server)
        .await;
}

/// Mount the single-file route for an asset created by [`asset`].
pub async fn mount_asset_file(server: &MockServer, album_id: &str, asset_id: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/media/albums/{}/{}.jpg", album_id, asset_id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(asset_id.as_bytes().to_vec()))
        .expect(hits)
        .mount(server)
        .await;
}

/// Number of requests the server has seen so far.
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|r| r.len())
        .unwrap_or_default()
}
