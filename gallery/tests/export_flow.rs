use api_client::{Album, ApiClient};
use async_trait::async_trait;
use gallery::export::{DOWNLOAD_UNAVAILABLE, ZIP_UNAVAILABLE};
use gallery::{DirectorySink, DownloadSink, ExportOrchestrator, ExportOutcome, GalleryError, LikedSet};
use mocks::matchers::{method, path};
use mocks::{start_mock_server, Mock, ResponseTemplate};
use std::path::PathBuf;

#[derive(Default)]
struct MemorySink {
    files: Vec<(String, Vec<u8>)>,
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn save(&mut self, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        self.files.push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}

impl MemorySink {
    fn names(&self) -> Vec<&str> {
        self.files.iter().map(|(n, _)| n.as_str()).collect()
    }
}

fn album(id: &str, title: &str, assets: &[&str]) -> Album {
    serde_json::from_value(mocks::public_album(id, title, assets)).unwrap()
}

fn liked(ids: &[&str]) -> LikedSet {
    let mut set = LikedSet::new();
    for id in ids {
        set.toggle(id);
    }
    set
}

#[tokio::test]
async fn download_all_saves_server_archive() {
    let server = start_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/albums/1/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK-zip".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let mut export = ExportOrchestrator::new(ApiClient::with_base_url(server.uri()), MemorySink::default());
    let outcome = export
        .download_all(&album("1", "Summer Trip", &["a", "b"]))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ExportOutcome::Archive { file_name: "Summer_Trip_full_album.zip".into() }
    );
    assert_eq!(export.sink().files[0].1, b"PK-zip");
    assert!(!export.in_progress());
}

#[tokio::test]
async fn failed_archive_falls_back_to_first_photo_only() {
    let server = start_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/albums/1/download"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mocks::mount_asset_file(&server, "1", "a", 1).await;
    mocks::mount_asset_file(&server, "1", "b", 0).await;

    let mut export = ExportOrchestrator::new(ApiClient::with_base_url(server.uri()), MemorySink::default());
    let outcome = export
        .download_all(&album("1", "Trip", &["a", "b"]))
        .await
        .unwrap();

    assert_eq!(outcome, ExportOutcome::SingleFallback { file_name: "a.jpg".into() });
    assert_eq!(export.sink().names(), ["a.jpg"]);
}

#[tokio::test]
async fn empty_album_download_is_skipped_without_request() {
    let server = start_mock_server().await;
    let mut export = ExportOrchestrator::new(ApiClient::with_base_url(server.uri()), MemorySink::default());
    let outcome = export.download_all(&album("1", "Empty", &[])).await.unwrap();
    assert_eq!(outcome, ExportOutcome::Skipped);
    assert_eq!(mocks::request_count(&server).await, 0);
}

#[tokio::test]
async fn download_liked_with_empty_selection_sends_nothing() {
    let server = start_mock_server().await;
    let mut export = ExportOrchestrator::new(ApiClient::with_base_url(server.uri()), MemorySink::default());

    let err = export
        .download_liked(&album("1", "Trip", &["a", "b"]), &LikedSet::new())
        .await
        .unwrap_err();

    assert_eq!(err, GalleryError::NoSelection);
    assert_eq!(mocks::request_count(&server).await, 0);
    assert!(export.sink().files.is_empty());
    assert!(export.notice().is_some());
}

#[tokio::test]
async fn download_liked_saves_partial_archive() {
    let server = start_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/albums/1/download-liked"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK-liked".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let mut export = ExportOrchestrator::new(ApiClient::with_base_url(server.uri()), MemorySink::default());
    let outcome = export
        .download_liked(&album("1", "My Wedding", &["a", "b", "c"]), &liked(&["c", "a"]))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ExportOutcome::Archive { file_name: "My_Wedding_liked_images.zip".into() }
    );
}

#[tokio::test]
async fn failed_liked_archive_downloads_each_liked_photo() {
    let server = start_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/albums/1/download-liked"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mocks::mount_asset_file(&server, "1", "a", 1).await;
    mocks::mount_asset_file(&server, "1", "b", 0).await;
    mocks::mount_asset_file(&server, "1", "c", 1).await;

    let mut export = ExportOrchestrator::new(ApiClient::with_base_url(server.uri()), MemorySink::default());
    let outcome = export
        .download_liked(&album("1", "Trip", &["a", "b", "c"]), &liked(&["a", "c"]))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ExportOutcome::IndividualFallback { file_names: vec!["a.jpg".into(), "c.jpg".into()] }
    );
    assert_eq!(export.notice(), Some(ZIP_UNAVAILABLE));
    assert!(!export.in_progress());
}

#[tokio::test]
async fn unreachable_server_reports_single_notice() {
    // Nothing listens on port 1.
    let client = ApiClient::with_base_url("http://127.0.0.1:1".into());
    let mut export = ExportOrchestrator::new(client, MemorySink::default());

    let err = export
        .download_all(&album("1", "Trip", &["a"]))
        .await
        .unwrap_err();

    assert!(matches!(err, GalleryError::TransientFailure(_)));
    assert_eq!(export.notice(), Some(DOWNLOAD_UNAVAILABLE));
    assert!(!export.in_progress());
    assert!(export.sink().files.is_empty());
}

#[tokio::test]
async fn download_one_uses_default_name_for_bare_directory() {
    let server = start_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/media/albums/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut export = ExportOrchestrator::new(
        ApiClient::with_base_url(server.uri()),
        DirectorySink::new(dir.path()),
    );
    let name = export.download_one("media/albums/1/").await.unwrap();
    assert_eq!(name, "photo.jpg");
    assert_eq!(std::fs::read(dir.path().join("photo.jpg")).unwrap(), b"img");
}

#[tokio::test]
async fn archive_names_stay_inside_download_dir() {
    let server = start_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/albums/1/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK-all".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/albums/1/download-liked"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK-liked".to_vec()))
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let downloads = root.path().join("downloads");
    let mut export = ExportOrchestrator::new(
        ApiClient::with_base_url(server.uri()),
        DirectorySink::new(&downloads),
    );

    let outcome = export
        .download_all(&album("1", "../escaped", &["a"]))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ExportOutcome::Archive { file_name: ".._escaped_full_album.zip".into() }
    );
    assert!(downloads.join(".._escaped_full_album.zip").exists());
    assert!(!root.path().join("escaped_full_album.zip").exists());

    let outcome = export
        .download_liked(&album("1", "2024/06 Wedding", &["a"]), &liked(&["a"]))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ExportOutcome::Archive { file_name: "2024_06_Wedding_liked_images.zip".into() }
    );
    assert_eq!(
        std::fs::read(downloads.join("2024_06_Wedding_liked_images.zip")).unwrap(),
        b"PK-liked"
    );
}
