//! API client module for the photo gallery server.

use reqwest::multipart::{Form, Part};
pub use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: String,
    pub file_path: String,
    #[serde(default)]
    pub thumb_path: Option<String>,
    #[serde(default)]
    pub album_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// List view entry. The list endpoint never carries assets.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AlbumSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub display_order: i64,
}

/// Payload of the unlock endpoint. Album fields are only present when `unlocked` is true.
#[derive(Debug, Deserialize, Clone)]
pub struct UnlockResponse {
    pub unlocked: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl UnlockResponse {
    /// Merge the revealed payload into the album record it unlocks.
    pub fn into_album(self, locked: &Album) -> Album {
        Album {
            id: self.id.unwrap_or_else(|| locked.id.clone()),
            title: self.title.unwrap_or_else(|| locked.title.clone()),
            description: self.description.or_else(|| locked.description.clone()),
            is_protected: locked.is_protected,
            is_published: locked.is_published,
            display_order: locked.display_order,
            cover_image: locked.cover_image.clone(),
            assets: self.assets,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub id: String,
    pub file_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadResponse {
    #[serde(default)]
    pub uploaded: Vec<UploadedAsset>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeleteResponse {
    pub deleted: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordResponse {
    pub id: String,
    pub is_protected: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReorderEntry {
    pub id: String,
    pub order: i64,
}

/// Branding keys of the site settings mapping.
pub const SITE_TITLE: &str = "site_title";
pub const SITE_SUBTITLE: &str = "site_subtitle";
pub const HERO_TEXT: &str = "hero_text";
pub const THEME_COLOR: &str = "theme_color";
pub const BACKGROUND_COLOR: &str = "background_color";

/// Flat branding mapping. Always sent whole, never as a diff.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SiteSettings {
    pub values: BTreeMap<String, String>,
}

impl SiteSettings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

/// A file queued for bulk upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub async fn from_path(path: &Path) -> Result<Self, ApiClientError> {
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| ApiClientError::Decode(format!("Invalid file name: {:?}", path)))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }
}

#[derive(Debug, Serialize)]
struct PublishRequest {
    is_published: bool,
}

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("Request Error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected status {status}: {text}")]
    UnexpectedStatus { status: StatusCode, text: String },
    #[error("Invalid URL: {0}")]
    Url(String),
    #[error("Decode Error: {0}")]
    Decode(String),
    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiClientError::UnexpectedStatus { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// True when the server answered, as opposed to a transport or decode failure.
    pub fn is_status(&self) -> bool {
        matches!(self, ApiClientError::UnexpectedStatus { .. })
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::debug!(%status, "gallery api returned an error status");
    Err(ApiClientError::UnexpectedStatus { status, text })
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiClientError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiClientError::Decode(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE.to_string())
    }

    /// Create a new client with a custom API base URL.
    pub fn with_base_url(base_url: String) -> Self {
        ApiClient {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a server-relative file or thumbnail path.
    pub fn asset_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Base URL extended with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiClientError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ApiClientError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiClientError::Url(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn list_albums(&self) -> Result<Vec<AlbumSummary>, ApiClientError> {
        let response = self.client.get(self.endpoint(&["api", "albums"])?).send().await?;
        decode(ensure_success(response).await?).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn get_album(&self, album_id: &str) -> Result<Album, ApiClientError> {
        let url = self.endpoint(&["api", "albums", album_id])?;
        let response = self.client.get(url).send().await?;
        decode(ensure_success(response).await?).await
    }

    /// Admin view of an album. Always includes assets.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn get_album_admin(&self, album_id: &str) -> Result<Album, ApiClientError> {
        let url = self.endpoint(&["api", "admin", "albums", album_id])?;
        let response = self.client.get(url).send().await?;
        decode(ensure_success(response).await?).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, password)))]
    pub async fn unlock_album(
        &self,
        album_id: &str,
        password: &str,
    ) -> Result<UnlockResponse, ApiClientError> {
        let url = self.endpoint(&["api", "albums", album_id, "unlock"])?;
        let response = self
            .client
            .post(url)
            .form(&[("password", password)])
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, password)))]
    pub async fn create_album(
        &self,
        title: &str,
        description: Option<&str>,
        password: Option<&str>,
    ) -> Result<Album, ApiClientError> {
        let mut fields = vec![("title", title)];
        if let Some(d) = description.filter(|d| !d.is_empty()) {
            fields.push(("description", d));
        }
        if let Some(p) = password.filter(|p| !p.is_empty()) {
            fields.push(("password", p));
        }
        let response = self
            .client
            .post(self.endpoint(&["api", "admin", "albums"])?)
            .form(&fields)
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, files)))]
    pub async fn upload_assets(
        &self,
        album_id: &str,
        files: Vec<UploadFile>,
    ) -> Result<UploadResponse, ApiClientError> {
        let url = self.endpoint(&["api", "admin", "albums", album_id, "upload-multiple"])?;
        let mut form = Form::new();
        for file in files {
            form = form.part("files", Part::bytes(file.bytes).file_name(file.file_name));
        }
        let response = self.client.post(url).multipart(form).send().await?;
        decode(ensure_success(response).await?).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn delete_album(&self, album_id: &str) -> Result<DeleteResponse, ApiClientError> {
        let url = self.endpoint(&["api", "admin", "albums", album_id])?;
        let response = self.client.delete(url).send().await?;
        decode(ensure_success(response).await?).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn delete_asset(&self, asset_id: &str) -> Result<DeleteResponse, ApiClientError> {
        let url = self.endpoint(&["api", "admin", "assets", asset_id])?;
        let response = self.client.delete(url).send().await?;
        decode(ensure_success(response).await?).await
    }

    /// Set or, with an empty password, clear the album password.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, password)))]
    pub async fn update_album_password(
        &self,
        album_id: &str,
        password: &str,
    ) -> Result<PasswordResponse, ApiClientError> {
        let url = self.endpoint(&["api", "admin", "albums", album_id, "password"])?;
        let response = self
            .client
            .put(url)
            .form(&[("password", password)])
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }

    /// Server-generated zip of the whole album.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn download_album(&self, album_id: &str) -> Result<Vec<u8>, ApiClientError> {
        let url = self.endpoint(&["api", "albums", album_id, "download"])?;
        let response = ensure_success(self.client.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Server-generated zip restricted to the given asset ids.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, asset_ids)))]
    pub async fn download_liked(
        &self,
        album_id: &str,
        asset_ids: &[String],
    ) -> Result<Vec<u8>, ApiClientError> {
        let url = self.endpoint(&["api", "albums", album_id, "download-liked"])?;
        let form = Form::new().text("liked_ids", serde_json::to_string(asset_ids)?);
        let response = ensure_success(self.client.post(url).multipart(form).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Raw bytes of a single asset file.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, ApiClientError> {
        let segments: Vec<&str> = file_path.trim_start_matches('/').split('/').collect();
        let url = self.endpoint(&segments)?;
        let response = ensure_success(self.client.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, entries)))]
    pub async fn reorder_albums(&self, entries: &[ReorderEntry]) -> Result<(), ApiClientError> {
        let response = self
            .client
            .post(self.endpoint(&["api", "admin", "albums", "reorder"])?)
            .json(entries)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn set_published(&self, album_id: &str, published: bool) -> Result<(), ApiClientError> {
        let url = self.endpoint(&["api", "admin", "albums", album_id, "publish"])?;
        let response = self
            .client
            .post(url)
            .json(&PublishRequest { is_published: published })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn get_site_settings(&self) -> Result<SiteSettings, ApiClientError> {
        let response = self.client.get(self.endpoint(&["api", "settings"])?).send().await?;
        decode(ensure_success(response).await?).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, settings)))]
    pub async fn update_site_settings(
        &self,
        settings: &SiteSettings,
    ) -> Result<SiteSettings, ApiClientError> {
        let response = self
            .client
            .put(self.endpoint(&["api", "admin", "settings"])?)
            .json(settings)
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }
}
