use std::sync::{Mutex, PoisonError};

use super::{SessionStore, StoreError, StoredSession};
use crate::models::UserSession;

/// Process-local store. Nothing survives the process.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `user` already stored.
    pub fn with_user(user: UserSession) -> Self {
        Self {
            slot: Mutex::new(Some(StoredSession::new(user))),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, user: &UserSession) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(StoredSession::new(user.clone()));
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
