//! Download intents: full album, liked subset, single file.
//!
//! Archive requests fall back to per-file downloads when the server answers
//! with an error status. Transport failures are reported as a single notice.

use api_client::{Album, ApiClient};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::GalleryError;
use crate::interaction::LikedSet;

pub const DEFAULT_FILE_NAME: &str = "photo.jpg";
pub const FULL_ALBUM_SUFFIX: &str = "_full_album.zip";
pub const LIKED_SUFFIX: &str = "_liked_images.zip";
pub const DEFAULT_ARCHIVE_NAME: &str = "album.zip";
pub const DOWNLOAD_UNAVAILABLE: &str = "Download not available right now.";
pub const ZIP_UNAVAILABLE: &str = "Zip download not available. Downloading images individually...";

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

fn is_dot_segment(name: &str) -> bool {
    matches!(name, "" | "." | "..")
}

/// Archive file name: whitespace runs in the title become `_`, as do path
/// separators, so the name always stays inside the download directory.
pub fn archive_name(title: &str, suffix: &str) -> String {
    let mut name = String::with_capacity(title.len() + suffix.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(if is_separator(c) { '_' } else { c });
            in_space = false;
        }
    }
    name.push_str(suffix);
    if is_dot_segment(&name) {
        return DEFAULT_ARCHIVE_NAME.to_string();
    }
    name
}

/// Final path segment of a server file path, or [`DEFAULT_FILE_NAME`] when
/// that segment is empty or a dot segment.
pub fn file_name_from_path(file_path: &str) -> String {
    file_path
        .rsplit(is_separator)
        .next()
        .filter(|s| !is_dot_segment(s))
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_string()
}

/// Where downloaded bytes end up.
#[async_trait]
pub trait DownloadSink: Send {
    async fn save(&mut self, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf>;
}

/// Writes downloads into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&mut self, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        fs::write(&path, bytes).await?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved download");
        Ok(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing to download.
    Skipped,
    /// Server-generated zip saved under this name.
    Archive { file_name: String },
    /// Zip unavailable; the first asset was downloaded instead.
    SingleFallback { file_name: String },
    /// Zip unavailable; each liked asset was downloaded on its own.
    IndividualFallback { file_names: Vec<String> },
}

pub struct ExportOrchestrator<S: DownloadSink> {
    client: ApiClient,
    sink: S,
    in_progress: bool,
    notice: Option<String>,
}

impl<S: DownloadSink> ExportOrchestrator<S> {
    pub fn new(client: ApiClient, sink: S) -> Self {
        Self {
            client,
            sink,
            in_progress: false,
            notice: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, album), fields(album_id = %album.id)))]
    pub async fn download_all(&mut self, album: &Album) -> Result<ExportOutcome, GalleryError> {
        if album.assets.is_empty() {
            return Ok(ExportOutcome::Skipped);
        }
        self.in_progress = true;
        self.notice = None;
        let result = self.download_all_inner(album).await;
        self.finish(&result);
        result
    }

    async fn download_all_inner(&mut self, album: &Album) -> Result<ExportOutcome, GalleryError> {
        match self.client.download_album(&album.id).await {
            Ok(bytes) => {
                let file_name = archive_name(&album.title, FULL_ALBUM_SUFFIX);
                self.save(&file_name, &bytes).await?;
                Ok(ExportOutcome::Archive { file_name })
            }
            Err(e) if e.is_status() => {
                tracing::warn!(album_id = %album.id, error = %e, "album zip unavailable, downloading first photo");
                let first = &album.assets[0];
                let file_name = self.fetch_one(&first.file_path).await?;
                Ok(ExportOutcome::SingleFallback { file_name })
            }
            Err(e) => Err(GalleryError::TransientFailure(e.to_string())),
        }
    }

    /// Download the liked subset. An empty selection fails before any request.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, album, liked), fields(album_id = %album.id)))]
    pub async fn download_liked(
        &mut self,
        album: &Album,
        liked: &LikedSet,
    ) -> Result<ExportOutcome, GalleryError> {
        if album.assets.is_empty() || liked.is_empty() {
            let err = GalleryError::NoSelection;
            self.notice = Some(err.user_message());
            return Err(err);
        }
        self.in_progress = true;
        self.notice = None;
        let result = self.download_liked_inner(album, liked).await;
        self.finish(&result);
        result
    }

    async fn download_liked_inner(
        &mut self,
        album: &Album,
        liked: &LikedSet,
    ) -> Result<ExportOutcome, GalleryError> {
        match self.client.download_liked(&album.id, liked.ids()).await {
            Ok(bytes) => {
                let file_name = archive_name(&album.title, LIKED_SUFFIX);
                self.save(&file_name, &bytes).await?;
                Ok(ExportOutcome::Archive { file_name })
            }
            Err(e) if e.is_status() => {
                tracing::warn!(album_id = %album.id, error = %e, "liked zip unavailable, downloading individually");
                let mut file_names = Vec::new();
                let mut failed = 0usize;
                for id in liked.ids() {
                    let Some(asset) = album.assets.iter().find(|a| &a.id == id) else {
                        continue;
                    };
                    match self.fetch_one(&asset.file_path).await {
                        Ok(name) => file_names.push(name),
                        Err(err) => {
                            tracing::error!(asset_id = %id, error = %err, "individual download failed");
                            failed += 1;
                        }
                    }
                }
                self.notice = Some(if failed > 0 {
                    DOWNLOAD_UNAVAILABLE.to_string()
                } else {
                    ZIP_UNAVAILABLE.to_string()
                });
                Ok(ExportOutcome::IndividualFallback { file_names })
            }
            Err(e) => Err(GalleryError::TransientFailure(e.to_string())),
        }
    }

    /// Save one asset under its final path segment.
    pub async fn download_one(&mut self, file_path: &str) -> Result<String, GalleryError> {
        self.in_progress = true;
        let result = self.fetch_one(file_path).await;
        self.in_progress = false;
        if result.is_err() {
            self.notice = Some(DOWNLOAD_UNAVAILABLE.to_string());
        }
        result
    }

    async fn fetch_one(&mut self, file_path: &str) -> Result<String, GalleryError> {
        let bytes = self
            .client
            .download_file(file_path)
            .await
            .map_err(|e| GalleryError::TransientFailure(e.to_string()))?;
        let file_name = file_name_from_path(file_path);
        self.save(&file_name, &bytes).await?;
        Ok(file_name)
    }

    async fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, GalleryError> {
        self.sink
            .save(file_name, bytes)
            .await
            .map_err(|e| GalleryError::TransientFailure(e.to_string()))
    }

    fn finish(&mut self, result: &Result<ExportOutcome, GalleryError>) {
        self.in_progress = false;
        if let Err(e) = result {
            tracing::error!(error = %e, "download failed");
            self.notice = Some(DOWNLOAD_UNAVAILABLE.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_collapses_whitespace() {
        assert_eq!(archive_name("Summer  Trip 2024", FULL_ALBUM_SUFFIX), "Summer_Trip_2024_full_album.zip");
        assert_eq!(archive_name("Wedding", LIKED_SUFFIX), "Wedding_liked_images.zip");
        assert_eq!(archive_name("a\tb", ".zip"), "a_b.zip");
    }

    #[test]
    fn archive_name_never_contains_separators() {
        assert_eq!(archive_name("2024/06 Wedding", LIKED_SUFFIX), "2024_06_Wedding_liked_images.zip");
        assert_eq!(archive_name("../escaped", FULL_ALBUM_SUFFIX), ".._escaped_full_album.zip");
        assert_eq!(archive_name("a\\b", ".zip"), "a_b.zip");
        assert_eq!(archive_name("..", ""), DEFAULT_ARCHIVE_NAME);
        assert_eq!(archive_name("", ""), DEFAULT_ARCHIVE_NAME);
    }

    #[test]
    fn file_name_uses_last_segment_or_default() {
        assert_eq!(file_name_from_path("media/albums/1/IMG_01.jpg"), "IMG_01.jpg");
        assert_eq!(file_name_from_path("plain.png"), "plain.png");
        assert_eq!(file_name_from_path("media/albums/1/"), DEFAULT_FILE_NAME);
        assert_eq!(file_name_from_path(""), DEFAULT_FILE_NAME);
    }

    #[test]
    fn file_name_rejects_dot_segments_and_backslashes() {
        assert_eq!(file_name_from_path("media/albums/.."), DEFAULT_FILE_NAME);
        assert_eq!(file_name_from_path("media/albums/."), DEFAULT_FILE_NAME);
        assert_eq!(file_name_from_path("media\\albums\\x.jpg"), "x.jpg");
        assert_eq!(file_name_from_path("media/albums\\.."), DEFAULT_FILE_NAME);
    }

    #[tokio::test]
    async fn directory_sink_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("downloads"));
        let path = sink.save("a.jpg", b"abc").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }
}
