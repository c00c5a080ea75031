//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: which
//! identity service to talk to, where the session is kept, and the sign-out
//! policy.
//!
//! Configuration is stored at `~/.config/arenasession/config.json`.
//! `ARENASESSION_BASE_URL` and `ARENASESSION_TIMEOUT_SECS` override the file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{ApiClient, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::auth::SignOutPolicy;
use crate::store::{FileSessionStore, KeyringSessionStore, MemorySessionStore, SessionStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "arenasession";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_BASE_URL: &str = "ARENASESSION_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "ARENASESSION_TIMEOUT_SECS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub store_backend: StoreBackend,
    pub clear_on_failed_sign_out: bool,
    pub last_identifier: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            store_backend: StoreBackend::default(),
            clear_on_failed_sign_out: false,
            last_identifier: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn sign_out_policy(&self) -> SignOutPolicy {
        if self.clear_on_failed_sign_out {
            SignOutPolicy::AlwaysClear
        } else {
            SignOutPolicy::ClearOnConfirm
        }
    }

    pub fn build_client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.base_url, self.request_timeout_secs)
            .context("Failed to create API client")
    }

    /// Open the session store the config selects.
    pub fn open_store(&self) -> Result<Arc<dyn SessionStore>> {
        Ok(match self.store_backend {
            StoreBackend::File => Arc::new(FileSessionStore::new(self.cache_dir()?)),
            StoreBackend::Keyring => {
                Arc::new(KeyringSessionStore::new().context("Failed to open keychain entry")?)
            }
            StoreBackend::Memory => Arc::new(MemorySessionStore::new()),
        })
    }
}
