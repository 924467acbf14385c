//! Album visibility: who may see an album's assets, and the unlock handshake.

use api_client::{Album, ApiClient, Asset};

use crate::error::GalleryError;
use crate::interaction::PhotoInteraction;

pub const INVALID_PASSWORD: &str = "Invalid password";
pub const UNLOCK_FAILED: &str = "Something went wrong";

/// A protected album before unlock. Built without any asset, file path or
/// cover reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedAlbum {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    is_published: bool,
    display_order: i64,
}

impl From<Album> for LockedAlbum {
    fn from(album: Album) -> Self {
        Self {
            id: album.id,
            title: album.title,
            description: album.description,
            is_published: album.is_published,
            display_order: album.display_order,
        }
    }
}

impl LockedAlbum {
    fn header(&self) -> Album {
        Album {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            is_protected: true,
            is_published: self.is_published,
            display_order: self.display_order,
            cover_image: None,
            assets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessState {
    Loading,
    NotFound,
    Locked(LockedAlbum),
    Unlocked(Album),
}

impl AccessState {
    pub fn name(&self) -> &'static str {
        match self {
            AccessState::Loading => "loading",
            AccessState::NotFound => "not_found",
            AccessState::Locked(_) => "locked",
            AccessState::Unlocked(_) => "unlocked",
        }
    }
}

/// One album-viewing session: access state, password input, and the viewer's
/// like/sort state.
pub struct AlbumView {
    client: ApiClient,
    album_id: String,
    state: AccessState,
    password: String,
    notice: Option<String>,
    interaction: PhotoInteraction,
}

impl AlbumView {
    pub fn new(client: ApiClient, album_id: impl Into<String>) -> Self {
        Self {
            client,
            album_id: album_id.into(),
            state: AccessState::Loading,
            password: String::new(),
            notice: None,
            interaction: PhotoInteraction::new(),
        }
    }

    /// Create the view and run the initial load.
    pub async fn open(client: ApiClient, album_id: impl Into<String>) -> Result<Self, GalleryError> {
        let mut view = Self::new(client, album_id);
        view.load().await?;
        Ok(view)
    }

    /// Fetch album metadata and resolve the initial access state.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self), fields(album_id = %self.album_id)))]
    pub async fn load(&mut self) -> Result<(), GalleryError> {
        self.state = AccessState::Loading;
        match self.client.get_album(&self.album_id).await {
            Ok(album) if album.is_protected => {
                self.state = AccessState::Locked(LockedAlbum::from(album));
            }
            Ok(album) => {
                self.state = AccessState::Unlocked(album);
            }
            Err(e) if e.is_not_found() => {
                self.state = AccessState::NotFound;
                tracing::info!(album_id = %self.album_id, "album not found");
                return Err(GalleryError::NotFound);
            }
            Err(e) => {
                tracing::error!(album_id = %self.album_id, error = %e, "failed to load album");
                let err = GalleryError::TransientFailure(e.to_string());
                self.notice = Some(err.user_message());
                return Err(err);
            }
        }
        self.notice = None;
        tracing::info!(album_id = %self.album_id, state = self.state.name(), "album loaded");
        Ok(())
    }

    /// Re-mount the view for another album. Likes and sort preference do not
    /// carry over.
    pub async fn navigate(&mut self, album_id: &str) -> Result<(), GalleryError> {
        if self.album_id != album_id {
            self.album_id = album_id.to_string();
            self.interaction.reset();
            self.password.clear();
            self.notice = None;
        }
        self.load().await
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Relay the password to the server. Only the server's verdict moves the
    /// view to `Unlocked`; the input is cleared on every outcome.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self), fields(album_id = %self.album_id)))]
    pub async fn unlock(&mut self) -> Result<(), GalleryError> {
        let locked = match &self.state {
            AccessState::Locked(locked) => locked.clone(),
            _ => return Ok(()),
        };
        let password = std::mem::take(&mut self.password);

        let result = match self.client.unlock_album(&locked.id, &password).await {
            Ok(resp) if resp.unlocked => {
                let album = resp.into_album(&locked.header());
                tracing::info!(album_id = %album.id, assets = album.assets.len(), "album unlocked");
                self.state = AccessState::Unlocked(album);
                Ok(())
            }
            Ok(_) => Err(GalleryError::InvalidCredential),
            Err(e) if e.is_status() => {
                tracing::debug!(error = %e, "unlock rejected");
                Err(GalleryError::InvalidCredential)
            }
            Err(e) => {
                tracing::error!(error = %e, "unlock request failed");
                Err(GalleryError::TransientFailure(e.to_string()))
            }
        };

        self.notice = match &result {
            Ok(()) => None,
            Err(GalleryError::InvalidCredential) => Some(INVALID_PASSWORD.to_string()),
            Err(_) => Some(UNLOCK_FAILED.to_string()),
        };
        result
    }

    pub fn album_id(&self) -> &str {
        &self.album_id
    }

    pub fn state(&self) -> &AccessState {
        &self.state
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, AccessState::Unlocked(_))
    }

    pub fn title(&self) -> Option<&str> {
        match &self.state {
            AccessState::Locked(l) => Some(&l.title),
            AccessState::Unlocked(a) => Some(&a.title),
            _ => None,
        }
    }

    /// The full album record, available only once unlocked.
    pub fn album(&self) -> Option<&Album> {
        match &self.state {
            AccessState::Unlocked(album) => Some(album),
            _ => None,
        }
    }

    /// Server-ordered assets. Empty unless unlocked.
    pub fn assets(&self) -> &[Asset] {
        self.album().map(|a| a.assets.as_slice()).unwrap_or(&[])
    }

    /// Assets in display order, honoring the sort-by-liked preference.
    pub fn visible_assets(&self) -> Vec<&Asset> {
        self.interaction.effective_order(self.assets())
    }

    pub fn asset_urls(&self) -> Vec<String> {
        self.visible_assets()
            .into_iter()
            .map(|a| self.client.asset_url(&a.file_path))
            .collect()
    }

    /// Hero image: the first asset in server order.
    pub fn featured_url(&self) -> Option<String> {
        self.assets().first().map(|a| self.client.asset_url(&a.file_path))
    }

    /// Like or unlike an asset of this album. Ids outside the current asset
    /// list are ignored and `None` is returned.
    pub fn toggle_like(&mut self, asset_id: &str) -> Option<bool> {
        if !self.assets().iter().any(|a| a.id == asset_id) {
            tracing::debug!(asset_id, "ignoring like for asset outside album");
            return None;
        }
        Some(self.interaction.toggle_like(asset_id))
    }

    pub fn toggle_sort(&mut self) -> bool {
        self.interaction.toggle_sort()
    }

    pub fn interaction(&self) -> &PhotoInteraction {
        &self.interaction
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}
