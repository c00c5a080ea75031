use std::sync::{Mutex, PoisonError};

use keyring::Entry;
use tracing::debug;

use super::{SessionStore, StoreError, StoredSession};
use crate::models::UserSession;

const SERVICE_NAME: &str = "arenasession";

/// Keychain account under which the session record is kept
const SESSION_ACCOUNT: &str = "userInfo";

/// Keeps the serialized session in the OS keychain.
pub struct KeyringSessionStore {
    entry: Entry,
    lock: Mutex<()>,
}

impl KeyringSessionStore {
    pub fn new() -> Result<Self, StoreError> {
        let entry = Entry::new(SERVICE_NAME, SESSION_ACCOUNT).map_err(keychain_error)?;
        Ok(Self {
            entry,
            lock: Mutex::new(()),
        })
    }
}

fn keychain_error(err: keyring::Error) -> StoreError {
    StoreError::Keychain(err.to_string())
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.entry.get_password() {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keychain_error(e)),
        }
    }

    fn save(&self, user: &UserSession) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let contents = serde_json::to_string(&StoredSession::new(user.clone()))?;
        self.entry.set_password(&contents).map_err(keychain_error)?;
        debug!("Session saved to keychain");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keychain_error(e)),
        }
    }
}
