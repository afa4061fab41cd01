// ── Session file ──
//
// One JSON file per profile holding the backend token, the user it
// belongs to and the time of the last batch check.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use branchwatch_core::{CoreError, Session, SessionStore, User};

use crate::ConfigError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    logged_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_check: Option<DateTime<Utc>>,
}

/// `SessionStore` backed by `<data dir>/sessions/<profile>.json`.
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Session store for a profile at the platform data location.
    pub fn for_profile(profile_name: &str) -> Self {
        Self::at(crate::session_path(profile_name))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SessionFile, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(SessionFile::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, file: &SessionFile) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(file)?)?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    /// Read-modify-write under the in-process lock.
    fn update(&self, f: impl FnOnce(&mut SessionFile)) -> Result<(), CoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.read().map_err(storage)?;
        f(&mut file);
        self.write(&file).map_err(storage)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[allow(clippy::needless_pass_by_value)]
fn storage(err: ConfigError) -> CoreError {
    CoreError::Storage {
        message: err.to_string(),
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, CoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let file = self.read().map_err(storage)?;
        Ok(file
            .token
            .filter(|t| !t.is_empty())
            .map(|token| Session {
                token: SecretString::from(token),
                user: file.user,
                logged_in_at: file.logged_in_at.unwrap_or_else(Utc::now),
            }))
    }

    fn save(&self, session: &Session) -> Result<(), CoreError> {
        self.update(|file| {
            file.token = Some(session.token.expose_secret().to_owned());
            file.user.clone_from(&session.user);
            file.logged_in_at = Some(session.logged_in_at);
        })
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.update(|file| {
            file.token = None;
            file.user = None;
            file.logged_in_at = None;
        })
    }

    fn last_check(&self) -> Result<Option<DateTime<Utc>>, CoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read().map_err(storage)?.last_check)
    }

    fn record_check(&self, at: DateTime<Utc>) -> Result<(), CoreError> {
        self.update(|file| file.last_check = Some(at))
    }
}
