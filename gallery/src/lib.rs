//! Client-side workflows of the photo gallery: album access, likes and
//! sorting, downloads, and admin mutations.

pub mod access;
pub mod admin;
pub mod error;
pub mod export;
pub mod interaction;
pub mod settings;

pub use access::{AccessState, AlbumView, LockedAlbum};
pub use admin::{AdminCoordinator, AdminGuard, AlbumEditor, AlbumForm, Confirm};
pub use error::GalleryError;
pub use export::{DirectorySink, DownloadSink, ExportOrchestrator, ExportOutcome};
pub use interaction::{LikedSet, PhotoInteraction};
pub use settings::SettingsEditor;
