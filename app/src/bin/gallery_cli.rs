use api_client::{ApiClient, SiteSettings};
use auth::{AdminPolicy, SessionStore, User};
use clap::{ArgAction, Parser, Subcommand};
use gallery::{
    AccessState, AdminCoordinator, AdminGuard, AlbumEditor, AlbumView, DirectorySink,
    ExportOrchestrator, ExportOutcome, GalleryError, SettingsEditor,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

#[path = "../config.rs"]
mod config;

#[derive(Parser)]
#[command(name = "gallery_cli", author, version, about = "Photo gallery command line client")]
struct Cli {
    /// Override the API base URL
    #[arg(long)]
    api_base: Option<String>,
    /// Override log level (e.g. info, debug)
    #[arg(long)]
    log_level: Option<String>,
    /// Directory downloads are written to
    #[arg(long)]
    download_dir: Option<PathBuf>,
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List albums
    ListAlbums,
    /// Show an album, unlocking it when a password is given
    ShowAlbum {
        id: String,
        #[arg(long)]
        password: Option<String>,
        /// Mark a photo as liked (repeatable)
        #[arg(long = "like")]
        likes: Vec<String>,
        /// List liked photos first
        #[arg(long)]
        liked_first: bool,
    },
    /// Download the whole album as a zip
    DownloadAll {
        id: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Download the liked photos of an album
    DownloadLiked {
        id: String,
        /// Liked photo id (repeatable)
        #[arg(long = "like")]
        likes: Vec<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Download a single file by its server path
    DownloadOne { file_path: String },
    /// Remember the signed-in administrator
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Create an album
    CreateAlbum {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete an album and all of its photos
    DeleteAlbum {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Persist a new album order
    Reorder {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Publish or unpublish an album
    Publish {
        id: String,
        #[arg(long, action = ArgAction::Set)]
        state: bool,
    },
    /// Show or change site settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Upload photos into an album
    Upload {
        album_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete one photo
    DeleteAsset { album_id: String, asset_id: String },
    /// Set or clear an album password
    SetPassword {
        album_id: String,
        /// Empty removes protection
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Show an album with admin access
    AdminAlbum { album_id: String },
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = config::AppConfigOverrides {
        api_base: cli.api_base.clone(),
        log_level: cli.log_level.clone(),
        download_dir: cli.download_dir.clone(),
    };
    let cfg = config::AppConfig::load_from(cli.config.clone()).apply_overrides(&overrides);
    std::fs::create_dir_all(&cfg.data_dir)?;
    let file_appender = rolling::daily(&cfg.data_dir, "gallery.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cfg.log_level.clone()))
        .with_writer(std::io::stderr.and(file_writer))
        .init();

    if let Err(e) = run(cli.command, &cfg).await {
        tracing::debug!(error = %e, "command failed");
        eprintln!("{}", e.user_message());
        drop(guard);
        std::process::exit(1);
    }
    Ok(())
}

fn print_settings(settings: &SiteSettings) {
    for (key, value) in &settings.values {
        println!("{} = {}", key, value);
    }
}

fn print_outcome(outcome: &ExportOutcome, dir: &std::path::Path) {
    match outcome {
        ExportOutcome::Skipped => println!("Nothing to download"),
        ExportOutcome::Archive { file_name } => {
            println!("Saved {}", dir.join(file_name).display())
        }
        ExportOutcome::SingleFallback { file_name } => {
            println!("Zip unavailable, saved {}", dir.join(file_name).display())
        }
        ExportOutcome::IndividualFallback { file_names } => {
            for name in file_names {
                println!("Saved {}", dir.join(name).display());
            }
        }
    }
}

fn stdin_confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn open_view(
    client: ApiClient,
    id: &str,
    password: Option<String>,
) -> Result<AlbumView, GalleryError> {
    let mut view = AlbumView::open(client, id).await?;
    if let (AccessState::Locked(_), Some(pw)) = (view.state(), password) {
        view.set_password(pw);
        view.unlock().await?;
    }
    Ok(view)
}

fn admin_guard(policy: AdminPolicy) -> Result<AdminGuard, GalleryError> {
    let ctx = SessionStore::new().load()?;
    Ok(AdminGuard::new(ctx, policy))
}

async fn run(command: Commands, cfg: &config::AppConfig) -> Result<(), GalleryError> {
    let client = ApiClient::with_base_url(cfg.api_base.clone());

    match command {
        Commands::ListAlbums => {
            let albums = client.list_albums().await?;
            if albums.is_empty() {
                println!("No albums");
            }
            for album in albums {
                let lock = if album.is_protected { " [protected]" } else { "" };
                println!("{} (id: {}){}", album.title, album.id, lock);
            }
        }
        Commands::ShowAlbum {
            id,
            password,
            likes,
            liked_first,
        } => {
            let mut view = open_view(client, &id, password).await?;
            println!("{} [{}]", view.title().unwrap_or_default(), view.state().name());
            if !view.is_unlocked() {
                println!("This album is password protected");
                return Ok(());
            }
            for like in &likes {
                view.toggle_like(like);
            }
            if liked_first {
                view.toggle_sort();
            }
            let liked = view.interaction().liked().clone();
            for asset in view.visible_assets() {
                let mark = if liked.contains(&asset.id) { "*" } else { " " };
                println!("{} {} {}", mark, asset.id, asset.file_path);
            }
        }
        Commands::DownloadAll { id, password } => {
            let view = open_view(client.clone(), &id, password).await?;
            let album = view
                .album()
                .ok_or_else(|| GalleryError::ValidationFailure("Album is locked".into()))?;
            let mut export =
                ExportOrchestrator::new(client, DirectorySink::new(&cfg.download_dir));
            let outcome = export.download_all(album).await?;
            print_outcome(&outcome, &cfg.download_dir);
        }
        Commands::DownloadLiked {
            id,
            likes,
            password,
        } => {
            let mut view = open_view(client.clone(), &id, password).await?;
            for like in &likes {
                view.toggle_like(like);
            }
            let album = view
                .album()
                .ok_or_else(|| GalleryError::ValidationFailure("Album is locked".into()))?;
            let mut export =
                ExportOrchestrator::new(client, DirectorySink::new(&cfg.download_dir));
            let outcome = export.download_liked(album, view.interaction().liked()).await?;
            if let Some(notice) = export.notice() {
                println!("{}", notice);
            }
            print_outcome(&outcome, &cfg.download_dir);
        }
        Commands::DownloadOne { file_path } => {
            let mut export =
                ExportOrchestrator::new(client, DirectorySink::new(&cfg.download_dir));
            let name = export.download_one(&file_path).await?;
            println!("Saved {}", cfg.download_dir.join(name).display());
        }
        Commands::Login { email, name } => {
            let user = User {
                id: None,
                email,
                name,
            };
            let ctx = SessionStore::new().sign_in(user, &cfg.admin_policy())?;
            if let Some(user) = ctx.user {
                println!("Signed in as {}", user.email);
            }
        }
        Commands::Logout => {
            SessionStore::new().sign_out()?;
            println!("Signed out");
        }
        Commands::CreateAlbum {
            title,
            description,
            password,
        } => {
            let mut coord = AdminCoordinator::new(client, admin_guard(cfg.admin_policy())?);
            let form = coord.form_mut();
            form.title = title;
            form.description = description.unwrap_or_default();
            form.password = password.unwrap_or_default();
            let album = coord.create_album().await?;
            println!("Album created: {} (id: {})", album.title, album.id);
        }
        Commands::DeleteAlbum { id, yes } => {
            let mut coord = AdminCoordinator::new(client, admin_guard(cfg.admin_policy())?);
            let mut confirm = |prompt: &str| yes || stdin_confirm(prompt);
            if coord.delete_album(&id, &mut confirm).await? {
                println!("Album deleted: {}", id);
            } else {
                println!("Cancelled");
            }
        }
        Commands::Reorder { ids } => {
            let mut coord = AdminCoordinator::new(client, admin_guard(cfg.admin_policy())?);
            coord.load_albums().await?;
            coord.reorder(&ids).await?;
            for album in coord.albums() {
                println!("{} {}", album.display_order, album.id);
            }
        }
        Commands::Publish { id, state } => {
            let mut coord = AdminCoordinator::new(client, admin_guard(cfg.admin_policy())?);
            coord.toggle_publish(&id, state).await?;
            let label = if state { "published" } else { "unpublished" };
            println!("Album {} {}", id, label);
        }
        Commands::Settings { action } => {
            let mut editor = SettingsEditor::new(client, admin_guard(cfg.admin_policy())?);
            editor.load().await?;
            match action {
                SettingsAction::Show => print_settings(editor.settings()),
                SettingsAction::Set { key, value } => {
                    editor.begin_edit()?;
                    editor.set(&key, &value)?;
                    editor.save().await?;
                    print_settings(editor.settings());
                }
            }
        }
        Commands::Upload { album_id, files } => {
            let mut editor = AlbumEditor::new(client, admin_guard(cfg.admin_policy())?, album_id);
            let count = editor.upload_paths(&files).await?;
            println!("Uploaded {} file(s)", count);
        }
        Commands::DeleteAsset { album_id, asset_id } => {
            let mut editor = AlbumEditor::new(client, admin_guard(cfg.admin_policy())?, album_id);
            editor.delete_asset(&asset_id).await?;
            println!("Photo deleted: {}", asset_id);
        }
        Commands::SetPassword { album_id, password } => {
            let mut editor = AlbumEditor::new(client, admin_guard(cfg.admin_policy())?, album_id);
            editor.set_password(password);
            let protected = editor.update_password().await?;
            if let Some(notice) = editor.notice() {
                println!("{}", notice);
            }
            println!("Protected: {}", protected);
        }
        Commands::AdminAlbum { album_id } => {
            let mut editor = AlbumEditor::new(client, admin_guard(cfg.admin_policy())?, album_id);
            let album = editor.load().await?;
            println!(
                "{} (id: {}) protected: {} published: {}",
                album.title, album.id, album.is_protected, album.is_published
            );
            for asset in &album.assets {
                println!("  {} {}", asset.id, asset.file_path);
            }
        }
    }
    Ok(())
}
