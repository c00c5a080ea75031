use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::{SessionStore, StoreError, StoredSession};
use crate::models::UserSession;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Keeps the session as a JSON file so it survives restarts.
pub struct FileSessionStore {
    cache_dir: PathBuf,
    // Serializes file access between concurrent operations
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn write_atomically(path: &Path, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        let stored: StoredSession = serde_json::from_str(&contents)?;
        Ok(Some(stored))
    }

    fn save(&self, user: &UserSession) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = StoredSession::new(user.clone());
        let contents = serde_json::to_string_pretty(&stored)?;
        Self::write_atomically(&self.session_path(), &contents)?;
        debug!(path = %self.session_path().display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(&path)?;
            debug!(path = %path.display(), "Session file removed");
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
