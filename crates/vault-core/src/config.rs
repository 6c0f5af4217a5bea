//! Service configuration
//!
//! Non-secret settings live in an optional JSON file. The encryption key
//! itself is never stored here, only where to find it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::crypto::{
    KeyProvider, KeychainKeyProvider, StaticKeyProvider, DEFAULT_KEYCHAIN_ACCOUNT,
    DEFAULT_KEY_ENV,
};
use crate::error::{Result, VaultError};
use crate::storage::FileCredentialStore;

/// Where the encryption key is loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    /// Environment variable named by `key_env`
    #[default]
    Env,
    /// OS keychain account named by `keychain_account`
    Keychain,
}

impl std::str::FromStr for KeySource {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "env" => Ok(Self::Env),
            "keychain" => Ok(Self::Keychain),
            other => Err(VaultError::Configuration(format!(
                "unknown key source {:?} (expected env or keychain)",
                other
            ))),
        }
    }
}

/// Vault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultConfig {
    /// Address the HTTP API binds to
    pub bind_address: String,
    /// Directory for `credentials.json` (platform data dir when unset)
    pub data_dir: Option<PathBuf>,
    /// Where the encryption key comes from
    pub key_source: KeySource,
    /// Environment variable holding the encoded key
    pub key_env: String,
    /// Keychain account holding the encoded key
    pub keychain_account: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            data_dir: None,
            key_source: KeySource::Env,
            key_env: DEFAULT_KEY_ENV.to_string(),
            keychain_account: DEFAULT_KEYCHAIN_ACCOUNT.to_string(),
        }
    }
}

impl VaultConfig {
    /// Load from a JSON file, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: VaultConfig = serde_json::from_str(&contents)
            .map_err(|e| VaultError::Configuration(format!("invalid config file: {}", e)))?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => FileCredentialStore::default_dir(),
        }
    }

    /// Load the configured key provider; any failure here is fatal at startup
    pub fn key_provider(&self) -> Result<Arc<dyn KeyProvider>> {
        match self.key_source {
            KeySource::Env => Ok(Arc::new(StaticKeyProvider::from_env(&self.key_env)?)),
            KeySource::Keychain => Ok(Arc::new(KeychainKeyProvider::load(
                &self.keychain_account,
            )?)),
        }
    }
}
