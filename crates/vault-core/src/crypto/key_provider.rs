//! Key provisioning
//!
//! The encryption key is loaded once at startup from the environment or the
//! OS secret store and held read-only for the life of the process. Nothing
//! here ever looks at request input.

use keyring::Entry;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::EncryptionKey;
use crate::error::{Result, VaultError};

/// Default environment variable holding the encoded key
pub const DEFAULT_KEY_ENV: &str = "PASSVAULT_ENCRYPTION_KEY";

/// Service name used for keychain entries
pub const KEYCHAIN_SERVICE: &str = "passvault";

/// Default keychain account holding the encoded key
pub const DEFAULT_KEYCHAIN_ACCOUNT: &str = "encryption-key";

/// Supplies the symmetric key used for every seal and open
pub trait KeyProvider: Send + Sync {
    /// Get the 256-bit key
    fn get_key(&self) -> Result<&EncryptionKey>;

    /// Human-readable name of the key source (never the key itself)
    fn source(&self) -> &'static str;
}

/// Key provider over an already loaded key
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    key: EncryptionKey,
    source: &'static str,
}

impl StaticKeyProvider {
    /// Wrap a key that was loaded elsewhere
    pub fn new(key: EncryptionKey) -> Self {
        Self {
            key,
            source: "static",
        }
    }

    /// Decode a hex or base64 encoded key
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        Ok(Self::new(EncryptionKey::from_encoded(encoded)?))
    }

    /// Load the encoded key from an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let encoded = Zeroizing::new(std::env::var(var).map_err(|_| {
            VaultError::Configuration(format!("environment variable {} is not set", var))
        })?);

        let key = EncryptionKey::from_encoded(&encoded)
            .map_err(|e| VaultError::Configuration(format!("{}: {}", var, strip_prefix(&e))))?;

        info!("Loaded encryption key from environment variable {}", var);
        Ok(Self {
            key,
            source: "environment",
        })
    }
}

impl KeyProvider for StaticKeyProvider {
    fn get_key(&self) -> Result<&EncryptionKey> {
        Ok(&self.key)
    }

    fn source(&self) -> &'static str {
        self.source
    }
}

/// Key provider backed by the OS keychain
///
/// - macOS: Keychain
/// - Windows: Credential Manager
/// - Linux: Secret Service
///
/// The entry is read once when the provider is built.
pub struct KeychainKeyProvider {
    key: EncryptionKey,
    account: String,
}

impl KeychainKeyProvider {
    /// Load the key stored under `account` in the `passvault` service
    pub fn load(account: &str) -> Result<Self> {
        let entry = Entry::new(KEYCHAIN_SERVICE, account)
            .map_err(|e| VaultError::Configuration(format!("keychain unavailable: {}", e)))?;

        let encoded = match entry.get_password() {
            Ok(value) => Zeroizing::new(value),
            Err(keyring::Error::NoEntry) => {
                return Err(VaultError::Configuration(format!(
                    "no encryption key stored in keychain account {}",
                    account
                )))
            }
            Err(e) => {
                return Err(VaultError::Configuration(format!(
                    "keychain read failed: {}",
                    e
                )))
            }
        };

        let key = EncryptionKey::from_encoded(&encoded)?;

        info!("Loaded encryption key from keychain account {}", account);
        Ok(Self {
            key,
            account: account.to_string(),
        })
    }

    /// Store an encoded key in the keychain (provisioning helper)
    pub fn store(account: &str, key: &EncryptionKey) -> Result<()> {
        let entry = Entry::new(KEYCHAIN_SERVICE, account)
            .map_err(|e| VaultError::Configuration(format!("keychain unavailable: {}", e)))?;

        entry
            .set_password(&key.to_base64())
            .map_err(|e| VaultError::Configuration(format!("keychain write failed: {}", e)))?;

        debug!("Stored encryption key in keychain account {}", account);
        Ok(())
    }

    /// Keychain account the key was read from
    pub fn account(&self) -> &str {
        &self.account
    }
}

impl KeyProvider for KeychainKeyProvider {
    fn get_key(&self) -> Result<&EncryptionKey> {
        Ok(&self.key)
    }

    fn source(&self) -> &'static str {
        "keychain"
    }
}

impl std::fmt::Debug for KeychainKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainKeyProvider")
            .field("account", &self.account)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn strip_prefix(err: &VaultError) -> String {
    match err {
        VaultError::Configuration(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable name so they can run in parallel
    #[test]
    fn test_from_env_loads_key() {
        let key = EncryptionKey::generate();
        std::env::set_var("PASSVAULT_TEST_KEY_OK", key.to_base64().as_str());

        let provider = StaticKeyProvider::from_env("PASSVAULT_TEST_KEY_OK").unwrap();
        assert_eq!(provider.get_key().unwrap(), &key);
        assert_eq!(provider.source(), "environment");
    }

    #[test]
    fn test_from_env_missing_is_configuration_error() {
        std::env::remove_var("PASSVAULT_TEST_KEY_MISSING");
        let result = StaticKeyProvider::from_env("PASSVAULT_TEST_KEY_MISSING");
        assert!(matches!(result, Err(VaultError::Configuration(_))));
    }

    #[test]
    fn test_from_env_wrong_length_is_configuration_error() {
        std::env::set_var("PASSVAULT_TEST_KEY_SHORT", "12345678");
        let err = StaticKeyProvider::from_env("PASSVAULT_TEST_KEY_SHORT").unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
        assert!(err.to_string().contains("PASSVAULT_TEST_KEY_SHORT"));
        assert!(!err.to_string().contains("12345678"));
    }

    #[test]
    fn test_from_encoded_hex() {
        let provider = StaticKeyProvider::from_encoded(&"ab".repeat(32)).unwrap();
        assert_eq!(provider.get_key().unwrap().as_bytes(), &[0xab; 32]);
        assert_eq!(provider.source(), "static");
    }

    #[test]
    fn test_provider_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StaticKeyProvider>();
        assert_send_sync::<KeychainKeyProvider>();
    }
}
