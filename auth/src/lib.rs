//! Session context and admin access policy for the gallery client.
//!
//! The identity provider issues sessions elsewhere. This crate only carries the
//! resulting read-only context into admin operations and remembers the signed-in
//! user between CLI invocations.

use keyring::Entry;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

const KEYRING_SERVICE_NAME: &str = "PhotoGallery";
const SESSION_ENTRY: &str = "session";

/// When set, the session is kept in `~/.photo_gallery/session.json` instead of
/// the system keyring.
pub const USE_FILE_STORE_ENV: &str = "USE_FILE_STORE";

/// Comma separated list of emails admitted to the admin surface.
pub const ALLOWED_ADMIN_EMAILS_ENV: &str = "ALLOWED_ADMIN_EMAILS";

static MOCK_STORE: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

fn use_mock_keyring() -> bool {
    std::env::var("MOCK_KEYRING").is_ok()
}

fn use_file_store() -> bool {
    std::env::var(USE_FILE_STORE_ENV).is_ok()
}

/// Location of the file-backed session.
pub fn session_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".photo_gallery")
        .join("session.json")
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Keyring Error: {0}")]
    Keyring(String),
    #[error("Not signed in")]
    Unauthenticated,
    #[error("Access denied for {0}")]
    Forbidden(String),
    #[error("Other Error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl User {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Read-only session snapshot handed to admin operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub status: SessionStatus,
}

impl AuthContext {
    pub fn authenticated(user: User) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
            status: SessionStatus::Authenticated,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            status: SessionStatus::Unauthenticated,
        }
    }

    pub fn loading() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            status: SessionStatus::Loading,
        }
    }
}

/// Which signed-in users may use the admin surface.
///
/// An empty allow-list admits any authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPolicy {
    allowed_emails: Vec<String>,
}

impl AdminPolicy {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_emails: emails
                .into_iter()
                .map(Into::into)
                .map(|e: String| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        match std::env::var(ALLOWED_ADMIN_EMAILS_ENV) {
            Ok(v) => Self::new(v.split(',')),
            Err(_) => Self::allow_all(),
        }
    }

    pub fn is_allowed(&self, email: &str) -> bool {
        self.allowed_emails.is_empty() || self.allowed_emails.iter().any(|e| e == email)
    }

    /// Guard run before every admin operation.
    pub fn authorize<'a>(&self, ctx: &'a AuthContext) -> Result<&'a User, AuthError> {
        let user = match (&ctx.status, ctx.is_authenticated, &ctx.user) {
            (SessionStatus::Authenticated, true, Some(user)) => user,
            _ => return Err(AuthError::Unauthenticated),
        };
        if !self.is_allowed(&user.email) {
            tracing::warn!(email = %user.email, "admin access denied");
            return Err(AuthError::Forbidden(user.email.clone()));
        }
        Ok(user)
    }
}

/// Persists the signed-in user in the system keyring.
#[derive(Debug, Clone, Default)]
pub struct SessionStore;

impl SessionStore {
    pub fn new() -> Self {
        Self
    }

    /// Admit `user` through `policy` and remember the session.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub fn sign_in(&self, user: User, policy: &AdminPolicy) -> Result<AuthContext, AuthError> {
        if !policy.is_allowed(&user.email) {
            return Err(AuthError::Forbidden(user.email));
        }
        let data = serde_json::to_string(&user).map_err(|e| AuthError::Other(e.to_string()))?;
        self.write(&data)?;
        tracing::info!(email = %user.email, "signed in");
        Ok(AuthContext::authenticated(user))
    }

    /// Current session, or an unauthenticated context when none is stored.
    pub fn load(&self) -> Result<AuthContext, AuthError> {
        match self.read()? {
            Some(data) => {
                let user: User =
                    serde_json::from_str(&data).map_err(|e| AuthError::Other(e.to_string()))?;
                Ok(AuthContext::authenticated(user))
            }
            None => Ok(AuthContext::unauthenticated()),
        }
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        if use_file_store() {
            return match std::fs::remove_file(session_file()) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(AuthError::Other(e.to_string())),
            };
        }
        if use_mock_keyring() {
            *MOCK_STORE.lock().map_err(|e| AuthError::Other(e.to_string()))? = None;
            return Ok(());
        }
        let entry = Entry::new(KEYRING_SERVICE_NAME, SESSION_ENTRY)
            .map_err(|e| AuthError::Keyring(e.to_string()))?;
        match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AuthError::Keyring(e.to_string())),
        }
    }

    fn write(&self, data: &str) -> Result<(), AuthError> {
        if use_file_store() {
            let path = session_file();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| AuthError::Other(e.to_string()))?;
            }
            return std::fs::write(path, data).map_err(|e| AuthError::Other(e.to_string()));
        }
        if use_mock_keyring() {
            *MOCK_STORE.lock().map_err(|e| AuthError::Other(e.to_string()))? = Some(data.to_string());
            return Ok(());
        }
        let entry = Entry::new(KEYRING_SERVICE_NAME, SESSION_ENTRY)
            .map_err(|e| AuthError::Keyring(e.to_string()))?;
        entry
            .set_password(data)
            .map_err(|e| AuthError::Keyring(e.to_string()))
    }

    fn read(&self) -> Result<Option<String>, AuthError> {
        if use_file_store() {
            return match std::fs::read_to_string(session_file()) {
                Ok(data) => Ok(Some(data)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(AuthError::Other(e.to_string())),
            };
        }
        if use_mock_keyring() {
            return Ok(MOCK_STORE
                .lock()
                .map_err(|e| AuthError::Other(e.to_string()))?
                .clone());
        }
        let entry = Entry::new(KEYRING_SERVICE_NAME, SESSION_ENTRY)
            .map_err(|e| AuthError::Keyring(e.to_string()))?;
        match entry.get_password() {
            Ok(data) => Ok(Some(data)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AuthError::Keyring(e.to_string())),
        }
    }
}
