use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides `api_base` from the config file.
pub const API_BASE_ENV: &str = "GALLERY_API_BASE";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub log_level: String,
    pub download_dir: PathBuf,
    pub data_dir: PathBuf,
    pub allowed_admin_emails: Vec<String>,
}

#[derive(Debug, Default)]
pub struct AppConfigOverrides {
    pub api_base: Option<String>,
    pub log_level: Option<String>,
    pub download_dir: Option<PathBuf>,
}

fn base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".photo_gallery")
}

fn default_path() -> PathBuf {
    base_dir().join("config")
}

impl AppConfig {
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(default_path);
        let cfg = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml).required(false))
            .build()
            .unwrap_or_default();

        let api_base = std::env::var(API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| cfg.get_string("api_base").ok())
            .unwrap_or_else(|| api_client::DEFAULT_API_BASE.to_string());
        let log_level = cfg
            .get_string("log_level")
            .unwrap_or_else(|_| "info".to_string());
        let data_dir = cfg
            .get_string("data_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir());
        let download_dir = cfg
            .get_string("download_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::download_dir().unwrap_or_else(|| data_dir.join("downloads"))
            });
        let allowed_admin_emails = cfg
            .get_array("allowed_admin_emails")
            .map(|values| {
                values
                    .into_iter()
                    .filter_map(|v| v.into_string().ok())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            api_base,
            log_level,
            download_dir,
            data_dir,
            allowed_admin_emails,
        }
    }

    pub fn apply_overrides(mut self, ov: &AppConfigOverrides) -> Self {
        if let Some(a) = &ov.api_base {
            self.api_base = a.clone();
        }
        if let Some(l) = &ov.log_level {
            self.log_level = l.clone();
        }
        if let Some(d) = &ov.download_dir {
            self.download_dir = d.clone();
        }
        self
    }

    /// Admin allow-list: the config file wins, then `ALLOWED_ADMIN_EMAILS`.
    pub fn admin_policy(&self) -> auth::AdminPolicy {
        if self.allowed_admin_emails.is_empty() {
            auth::AdminPolicy::from_env()
        } else {
            auth::AdminPolicy::new(self.allowed_admin_emails.iter().cloned())
        }
    }

    pub fn save_to(&self, path: Option<PathBuf>) -> std::io::Result<()> {
        let path = path.unwrap_or_else(default_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn missing_file_yields_defaults() {
        std::env::remove_var(API_BASE_ENV);
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(Some(dir.path().join("absent")));
        assert_eq!(cfg.api_base, api_client::DEFAULT_API_BASE);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.allowed_admin_emails.is_empty());
    }

    #[test]
    #[serial]
    fn saved_file_is_read_back() {
        std::env::remove_var(API_BASE_ENV);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        let cfg = AppConfig {
            api_base: "http://gallery.local".into(),
            log_level: "debug".into(),
            download_dir: dir.path().join("dl"),
            data_dir: dir.path().join("data"),
            allowed_admin_emails: vec!["owner@example.com".into()],
        };
        cfg.save_to(Some(path.clone())).unwrap();
        assert_eq!(AppConfig::load_from(Some(path)), cfg);
        assert!(cfg.admin_policy().is_allowed("owner@example.com"));
        assert!(!cfg.admin_policy().is_allowed("guest@example.com"));
    }

    #[test]
    #[serial]
    fn env_then_cli_override_api_base() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "api_base = \"http://from-file\"\n").unwrap();

        std::env::set_var(API_BASE_ENV, "http://from-env");
        let cfg = AppConfig::load_from(Some(path.clone()));
        assert_eq!(cfg.api_base, "http://from-env");

        let cfg = cfg.apply_overrides(&AppConfigOverrides {
            api_base: Some("http://from-cli".into()),
            ..Default::default()
        });
        assert_eq!(cfg.api_base, "http://from-cli");
        std::env::remove_var(API_BASE_ENV);
    }
}
