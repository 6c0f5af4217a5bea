//! # vault-core
//!
//! Core of passvault including:
//! - AES-256-GCM sealing of stored passwords with random nonces and a version byte
//! - Key providers for environment and OS keychain key sources
//! - Owner-scoped credential storage with in-memory and JSON file backends
//! - Out-of-band key rotation

pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod rotation;
pub mod storage;

pub use config::{KeySource, VaultConfig};
pub use credential::{
    Credential, CredentialChanges, CredentialService, CredentialUpdate, DecryptedCredential,
    NewCredential, OwnerId,
};
pub use crypto::{
    open, seal, CipherSuite, EncryptionKey, KeyProvider, KeychainKeyProvider, SealedBlob,
    SecretString, StaticKeyProvider, StoredBlob,
};
pub use error::{Result, VaultError};
pub use rotation::{rotate_key, RotationReport};
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
