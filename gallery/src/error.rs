use api_client::ApiClientError;
use auth::AuthError;
use thiserror::Error;

/// Failures surfaced by the gallery controllers. None of them is fatal; each
/// returns the acting view to an interactive state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GalleryError {
    #[error("Album not found")]
    NotFound,
    #[error("Invalid password")]
    InvalidCredential,
    #[error("Transient failure: {0}")]
    TransientFailure(String),
    #[error("No liked images selected")]
    NoSelection,
    #[error("Validation failure: {0}")]
    ValidationFailure(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl GalleryError {
    /// Default text shown to the user for this kind of failure.
    pub fn user_message(&self) -> String {
        match self {
            GalleryError::NotFound => "Album not found".to_string(),
            GalleryError::InvalidCredential => "Invalid password".to_string(),
            GalleryError::TransientFailure(_) => "Something went wrong".to_string(),
            GalleryError::NoSelection => "No liked images to download.".to_string(),
            GalleryError::ValidationFailure(msg) => msg.clone(),
            GalleryError::Unauthorized(_) => "Please sign in as an administrator.".to_string(),
        }
    }
}

impl GalleryError {
    /// Mapping for requests that fetch one album: a 404 means the album is gone.
    pub fn from_album_fetch(e: ApiClientError) -> Self {
        if e.is_not_found() {
            GalleryError::NotFound
        } else {
            GalleryError::TransientFailure(e.to_string())
        }
    }
}

impl From<ApiClientError> for GalleryError {
    fn from(e: ApiClientError) -> Self {
        GalleryError::TransientFailure(e.to_string())
    }
}

impl From<AuthError> for GalleryError {
    fn from(e: AuthError) -> Self {
        GalleryError::Unauthorized(e.to_string())
    }
}
