//! Site branding editor.

use api_client::{ApiClient, SiteSettings};

use crate::admin::AdminGuard;
use crate::error::GalleryError;

pub const SETTINGS_SAVE_FAILED: &str = "Failed to save settings. Please try again.";

pub struct SettingsEditor {
    client: ApiClient,
    guard: AdminGuard,
    saved: SiteSettings,
    draft: SiteSettings,
    editing: bool,
    notice: Option<String>,
}

impl SettingsEditor {
    pub fn new(client: ApiClient, guard: AdminGuard) -> Self {
        Self {
            client,
            guard,
            saved: SiteSettings::default(),
            draft: SiteSettings::default(),
            editing: false,
            notice: None,
        }
    }

    pub async fn load(&mut self) -> Result<&SiteSettings, GalleryError> {
        let settings = self.client.get_site_settings().await?;
        if !self.editing {
            self.draft = settings.clone();
        }
        self.saved = settings;
        Ok(&self.saved)
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.saved
    }

    pub fn draft(&self) -> &SiteSettings {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn begin_edit(&mut self) -> Result<(), GalleryError> {
        self.guard.check()?;
        if !self.editing {
            self.draft = self.saved.clone();
            self.editing = true;
        }
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), GalleryError> {
        if !self.editing {
            return Err(GalleryError::ValidationFailure("Not in edit mode".into()));
        }
        self.draft.set(key, value);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.draft = self.saved.clone();
        self.editing = false;
    }

    /// Send the whole draft. Edit mode ends only when the server accepts it.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn save(&mut self) -> Result<(), GalleryError> {
        self.guard.check()?;
        if !self.editing {
            return Ok(());
        }
        match self.client.update_site_settings(&self.draft).await {
            Ok(saved) => {
                tracing::info!(keys = saved.values.len(), "site settings saved");
                self.draft = saved.clone();
                self.saved = saved;
                self.editing = false;
                self.notice = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save site settings");
                self.notice = Some(SETTINGS_SAVE_FAILED.to_string());
                Err(GalleryError::TransientFailure(e.to_string()))
            }
        }
    }
}
