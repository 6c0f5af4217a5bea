//! Cryptographic primitives for password-at-rest protection
//!
//! This module provides:
//! - AES-256-GCM sealing with random nonces and a version byte
//! - Key providers for environment and OS keychain key sources
//! - Secure memory handling with zeroize

mod codec;
mod key_provider;
mod secure_memory;

pub use codec::{
    open, open_bytes, seal, CipherSuite, SealedBlob, StoredBlob, NONCE_LEN, SEAL_OVERHEAD,
    TAG_LEN,
};
pub use key_provider::{
    KeyProvider, KeychainKeyProvider, StaticKeyProvider, DEFAULT_KEYCHAIN_ACCOUNT,
    DEFAULT_KEY_ENV, KEYCHAIN_SERVICE,
};
pub use secure_memory::{EncryptionKey, SecretString, KEY_LEN};
