//! Persistent client-side slot for the active `UserSession`.
//!
//! The store holds at most one session. It is owned by whoever builds the
//! `AuthManager` and handed to it behind an `Arc`, so front ends and tests
//! choose the backend:
//!
//! - `FileSessionStore`: JSON file in the cache directory
//! - `KeyringSessionStore`: OS keychain entry
//! - `MemorySessionStore`: process-local, gone on exit
//!
//! Stored sessions never expire on their own. Staleness is only discovered
//! when an identity check fails.

pub mod file;
pub mod keychain;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::UserSession;

pub use keychain::KeyringSessionStore;
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session record could not be encoded or decoded: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keychain(String),
}

/// The persisted record: the user snapshot plus when it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: UserSession,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(user: UserSession) -> Self {
        Self {
            user,
            saved_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.saved_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Single-slot session storage.
///
/// Methods take `&self`; implementations synchronize internally. Concurrent
/// writers resolve last-writer-wins.
pub trait SessionStore: Send + Sync {
    /// Read the stored record, if any.
    fn load(&self) -> Result<Option<StoredSession>, StoreError>;

    /// Replace whatever is stored with `user`.
    fn save(&self, user: &UserSession) -> Result<(), StoreError>;

    /// Remove the stored record. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;

    /// The stored user, if any.
    fn current_user(&self) -> Result<Option<UserSession>, StoreError> {
        Ok(self.load()?.map(|stored| stored.user))
    }
}
