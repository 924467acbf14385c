//! Admin mutations over the album list and a single album.
//!
//! Reorder is applied optimistically and rolled back by re-fetching. Every
//! other mutation leaves local state alone and reloads after success.

use api_client::{Album, AlbumSummary, ApiClient, ReorderEntry, UploadFile};
use auth::{AdminPolicy, AuthContext};
use std::path::PathBuf;

use crate::error::GalleryError;

pub const DELETE_ALBUM_PROMPT: &str = "Are you sure you want to delete this album?";
pub const CREATE_FAILED: &str = "Failed to create album. Please try again.";
pub const MUTATION_FAILED: &str = "Something went wrong. Please try again.";
pub const PASSWORD_UPDATED: &str = "Password updated successfully!";
pub const PASSWORD_REJECTED: &str = "Failed to update password";
pub const PASSWORD_ERROR: &str = "Error updating password";

/// Asks the user to approve a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Checks the injected session before any admin request is issued.
#[derive(Debug, Clone)]
pub struct AdminGuard {
    ctx: AuthContext,
    policy: AdminPolicy,
}

impl AdminGuard {
    pub fn new(ctx: AuthContext, policy: AdminPolicy) -> Self {
        Self { ctx, policy }
    }

    pub fn check(&self) -> Result<(), GalleryError> {
        self.policy.authorize(&self.ctx)?;
        Ok(())
    }

    pub fn context(&self) -> &AuthContext {
        &self.ctx
    }
}

/// Create-album form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumForm {
    pub title: String,
    pub description: String,
    pub password: String,
}

impl AlbumForm {
    pub fn validate(&self) -> Result<(), GalleryError> {
        if self.title.trim().is_empty() {
            return Err(GalleryError::ValidationFailure("Title is required".into()));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Dashboard state: the album list and the create form.
pub struct AdminCoordinator {
    client: ApiClient,
    guard: AdminGuard,
    albums: Vec<AlbumSummary>,
    form: AlbumForm,
    notice: Option<String>,
}

impl AdminCoordinator {
    pub fn new(client: ApiClient, guard: AdminGuard) -> Self {
        Self {
            client,
            guard,
            albums: Vec::new(),
            form: AlbumForm::default(),
            notice: None,
        }
    }

    pub fn albums(&self) -> &[AlbumSummary] {
        &self.albums
    }

    pub fn form(&self) -> &AlbumForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut AlbumForm {
        &mut self.form
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Replace the local list with the server's.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn load_albums(&mut self) -> Result<(), GalleryError> {
        self.guard.check()?;
        self.albums = self.client.list_albums().await.map_err(|e| {
            tracing::error!(error = %e, "failed to load albums");
            GalleryError::from(e)
        })?;
        tracing::info!(count = self.albums.len(), "albums loaded");
        Ok(())
    }

    /// Submit the create form. The form is only cleared on success.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn create_album(&mut self) -> Result<Album, GalleryError> {
        self.guard.check()?;
        if let Err(e) = self.form.validate() {
            self.notice = Some(e.user_message());
            return Err(e);
        }
        let form = &self.form;
        let created = self
            .client
            .create_album(
                form.title.trim(),
                Some(form.description.as_str()),
                Some(form.password.as_str()),
            )
            .await;
        match created {
            Ok(album) => {
                tracing::info!(album_id = %album.id, protected = album.is_protected, "album created");
                self.form.clear();
                self.notice = None;
                self.reload_after_mutation().await;
                Ok(album)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to create album");
                self.notice = Some(CREATE_FAILED.to_string());
                Err(GalleryError::TransientFailure(e.to_string()))
            }
        }
    }

    /// Delete after explicit confirmation. Returns `false` when declined.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, confirm)))]
    pub async fn delete_album<C: Confirm>(
        &mut self,
        album_id: &str,
        confirm: &mut C,
    ) -> Result<bool, GalleryError> {
        self.guard.check()?;
        if !confirm.confirm(DELETE_ALBUM_PROMPT) {
            return Ok(false);
        }
        if let Err(e) = self.client.delete_album(album_id).await {
            tracing::error!(album_id, error = %e, "failed to delete album");
            self.notice = Some(MUTATION_FAILED.to_string());
            return Err(GalleryError::TransientFailure(e.to_string()));
        }
        tracing::info!(album_id, "album deleted");
        self.notice = None;
        self.reload_after_mutation().await;
        Ok(true)
    }

    /// Apply a new album order locally, then persist it. On failure the local
    /// list is discarded and fetched again.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, new_sequence)))]
    pub async fn reorder(&mut self, new_sequence: &[String]) -> Result<(), GalleryError> {
        self.guard.check()?;
        let reordered = self.arrange(new_sequence)?;
        let snapshot = std::mem::replace(&mut self.albums, reordered);
        for (idx, album) in self.albums.iter_mut().enumerate() {
            album.display_order = idx as i64;
        }
        let entries: Vec<ReorderEntry> = self
            .albums
            .iter()
            .map(|a| ReorderEntry {
                id: a.id.clone(),
                order: a.display_order,
            })
            .collect();

        if let Err(e) = self.client.reorder_albums(&entries).await {
            tracing::warn!(error = %e, "reorder failed, reloading albums");
            self.albums.clear();
            if let Err(reload) = self.load_albums().await {
                tracing::error!(error = %reload, "reload after failed reorder failed");
                self.albums = snapshot;
            }
            self.notice = Some(MUTATION_FAILED.to_string());
            return Err(GalleryError::TransientFailure(e.to_string()));
        }
        tracing::info!(count = entries.len(), "album order saved");
        self.notice = None;
        Ok(())
    }

    /// Drag helper: move the album at `from` to position `to`.
    pub async fn move_album(&mut self, from: usize, to: usize) -> Result<(), GalleryError> {
        if from >= self.albums.len() || to >= self.albums.len() {
            return Err(GalleryError::ValidationFailure("Position out of range".into()));
        }
        let mut ids: Vec<String> = self.albums.iter().map(|a| a.id.clone()).collect();
        let id = ids.remove(from);
        ids.insert(to, id);
        self.reorder(&ids).await
    }

    /// Publish or unpublish. The list is reloaded on success only.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn toggle_publish(&mut self, album_id: &str, published: bool) -> Result<(), GalleryError> {
        self.guard.check()?;
        if let Err(e) = self.client.set_published(album_id, published).await {
            tracing::error!(album_id, error = %e, "failed to change publish state");
            self.notice = Some(MUTATION_FAILED.to_string());
            return Err(GalleryError::TransientFailure(e.to_string()));
        }
        tracing::info!(album_id, published, "publish state changed");
        self.notice = None;
        self.reload_after_mutation().await;
        Ok(())
    }

    fn arrange(&self, new_sequence: &[String]) -> Result<Vec<AlbumSummary>, GalleryError> {
        if new_sequence.len() != self.albums.len() {
            return Err(GalleryError::ValidationFailure(
                "New order must list every album once".into(),
            ));
        }
        let mut arranged = Vec::with_capacity(new_sequence.len());
        for id in new_sequence {
            let album = self
                .albums
                .iter()
                .find(|a| &a.id == id)
                .ok_or_else(|| GalleryError::ValidationFailure(format!("Unknown album {}", id)))?;
            if arranged.iter().any(|a: &AlbumSummary| &a.id == id) {
                return Err(GalleryError::ValidationFailure(format!("Album {} listed twice", id)));
            }
            arranged.push(album.clone());
        }
        Ok(arranged)
    }

    // The mutation already succeeded; a failed refresh only leaves a stale list.
    async fn reload_after_mutation(&mut self) {
        if let Err(e) = self.load_albums().await {
            self.notice = Some(e.user_message());
        }
    }
}

/// Management view of one album: uploads, asset removal, password.
pub struct AlbumEditor {
    client: ApiClient,
    guard: AdminGuard,
    album_id: String,
    album: Option<Album>,
    uploading: bool,
    password: String,
    notice: Option<String>,
}

impl AlbumEditor {
    pub fn new(client: ApiClient, guard: AdminGuard, album_id: impl Into<String>) -> Self {
        Self {
            client,
            guard,
            album_id: album_id.into(),
            album: None,
            uploading: false,
            password: String::new(),
            notice: None,
        }
    }

    pub fn album(&self) -> Option<&Album> {
        self.album.as_ref()
    }

    pub fn uploading(&self) -> bool {
        self.uploading
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub async fn load(&mut self) -> Result<&Album, GalleryError> {
        self.guard.check()?;
        let album = self
            .client
            .get_album_admin(&self.album_id)
            .await
            .map_err(GalleryError::from_album_fetch)?;
        Ok(self.album.insert(album))
    }

    /// Bulk upload, then refresh. The uploading flag is cleared on every outcome.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, files), fields(album_id = %self.album_id)))]
    pub async fn upload(&mut self, files: Vec<UploadFile>) -> Result<usize, GalleryError> {
        self.guard.check()?;
        if files.is_empty() {
            return Ok(0);
        }
        self.uploading = true;
        let result = self.client.upload_assets(&self.album_id, files).await;
        let count = match result {
            Ok(resp) => resp.uploaded.len(),
            Err(e) => {
                self.uploading = false;
                tracing::error!(error = %e, "upload failed");
                self.notice = Some(MUTATION_FAILED.to_string());
                return Err(GalleryError::TransientFailure(e.to_string()));
            }
        };
        tracing::info!(album_id = %self.album_id, count, "assets uploaded");
        self.notice = None;
        self.reload_after_mutation().await;
        self.uploading = false;
        Ok(count)
    }

    pub async fn upload_paths(&mut self, paths: &[PathBuf]) -> Result<usize, GalleryError> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let file = UploadFile::from_path(path)
                .await
                .map_err(|e| GalleryError::ValidationFailure(e.to_string()))?;
            files.push(file);
        }
        self.upload(files).await
    }

    pub async fn delete_asset(&mut self, asset_id: &str) -> Result<(), GalleryError> {
        self.guard.check()?;
        if let Err(e) = self.client.delete_asset(asset_id).await {
            tracing::error!(asset_id, error = %e, "failed to delete asset");
            self.notice = Some(MUTATION_FAILED.to_string());
            return Err(GalleryError::TransientFailure(e.to_string()));
        }
        tracing::info!(asset_id, "asset deleted");
        self.notice = None;
        self.reload_after_mutation().await;
        Ok(())
    }

    // The mutation already succeeded; a failed refresh only leaves a stale album.
    async fn reload_after_mutation(&mut self) {
        if let Err(e) = self.load().await {
            tracing::warn!(album_id = %self.album_id, error = %e, "reload after mutation failed");
            self.notice = Some(e.user_message());
        }
    }

    /// Send the password input. An empty input removes protection.
    pub async fn update_password(&mut self) -> Result<bool, GalleryError> {
        self.guard.check()?;
        match self.client.update_album_password(&self.album_id, &self.password).await {
            Ok(resp) => {
                self.password.clear();
                self.notice = Some(PASSWORD_UPDATED.to_string());
                if let Some(album) = self.album.as_mut() {
                    album.is_protected = resp.is_protected;
                }
                Ok(resp.is_protected)
            }
            Err(e) if e.is_status() => {
                self.notice = Some(PASSWORD_REJECTED.to_string());
                Err(GalleryError::TransientFailure(e.to_string()))
            }
            Err(e) => {
                self.notice = Some(PASSWORD_ERROR.to_string());
                Err(GalleryError::TransientFailure(e.to_string()))
            }
        }
    }
}
