//! Persisted session slice.
//!
//! Only `{user, token, isAuthenticated}` survive a restart; transient flags
//! such as "authenticating" never reach storage.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.config/clausewise/
//!   auth-storage.json   # {"user": {...}, "token": "...", "isAuthenticated": true}
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::types::UserProfile;

/// File name of the single named storage entry.
pub const SESSION_ENTRY_NAME: &str = "auth-storage.json";

/// The part of the auth state that is persisted.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "isAuthenticated")]
    pub is_authenticated: bool,
}

impl PersistedSession {
    pub fn authenticated(user: Option<UserProfile>, token: impl Into<String>) -> Self {
        Self {
            user,
            token: Some(token.into()),
            is_authenticated: true,
        }
    }

    /// Enforce the session invariant: a token implies authenticated, no
    /// token implies no user.
    pub fn normalized(mut self) -> Self {
        if self.token.as_deref().is_some_and(str::is_empty) {
            self.token = None;
        }
        match self.token {
            Some(_) => self.is_authenticated = true,
            None => {
                self.user = None;
                self.is_authenticated = false;
            }
        }
        self
    }
}

impl fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedSession")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

/// Durable storage for the persisted session slice.
pub trait SessionStorage: Send + Sync + fmt::Debug {
    /// Load the stored session, `None` if nothing is stored.
    fn load(&self) -> ClientResult<Option<PersistedSession>>;

    fn save(&self, session: &PersistedSession) -> ClientResult<()>;

    /// Remove the stored session. Removing a missing entry is not an error.
    fn clear(&self) -> ClientResult<()>;
}

/// Session stored as a JSON file, written atomically.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    /// Storage at the platform default location.
    ///
    /// Default: `<config dir>/clausewise/auth-storage.json`
    pub fn new() -> ClientResult<Self> {
        Ok(Self {
            path: default_session_path()?,
        })
    }

    /// Storage at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Default location of the session entry.
pub fn default_session_path() -> ClientResult<PathBuf> {
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| ClientError::Storage {
            message: "could not determine config directory".to_string(),
        })?;

    Ok(base.join("clausewise").join(SESSION_ENTRY_NAME))
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> ClientResult<Option<PersistedSession>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no persisted session");
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| ClientError::Storage {
            message: format!("failed to read session file: {}", e),
        })?;
        let session: PersistedSession =
            serde_json::from_str(&content).map_err(|e| ClientError::Storage {
                message: format!("failed to parse session file: {}", e),
            })?;

        Ok(Some(session.normalized()))
    }

    fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ClientError::Storage {
                message: format!("failed to create session directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(session).map_err(|e| ClientError::Storage {
            message: format!("failed to serialize session: {}", e),
        })?;
        write_atomic(&self.path, &json)?;

        debug!(path = %self.path.display(), authenticated = session.is_authenticated, "session persisted");
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "persisted session removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage {
                message: format!("failed to remove session file: {}", e),
            }),
        }
    }
}

fn write_atomic(path: &Path, content: &str) -> ClientResult<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content).map_err(|e| ClientError::Storage {
        message: format!("failed to write temp file: {}", e),
    })?;

    // The entry holds a bearer token.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)) {
            warn!(error = %e, "failed to restrict session file permissions");
        }
    }

    fs::rename(&temp_path, path).map_err(|e| ClientError::Storage {
        message: format!("failed to rename temp file: {}", e),
    })?;

    Ok(())
}

/// In-memory storage, for tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entry: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            entry: Mutex::new(Some(session)),
        }
    }

    /// Raw stored value, without normalization.
    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> ClientResult<Option<PersistedSession>> {
        Ok(self.snapshot().map(PersistedSession::normalized))
    }

    fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        self.entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
