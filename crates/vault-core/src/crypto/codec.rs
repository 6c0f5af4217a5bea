//! AES-256-GCM sealing of stored passwords
//!
//! Sealed blob layout: `version (1) | nonce (12) | ciphertext (n) | tag (16)`
//! - version: cipher suite tag, see [`CipherSuite`]
//! - nonce: 12 random bytes, fresh for every seal
//! - tag: 16-byte GCM authentication tag
//!
//! At rest the blob is kept as standard base64 of those bytes.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use super::{EncryptionKey, SecretString};
use crate::error::{Result, VaultError};

/// Nonce length for AES-GCM
pub const NONCE_LEN: usize = 12;

/// Authentication tag length for AES-GCM
pub const TAG_LEN: usize = 16;

/// Bytes a sealed blob adds on top of the plaintext
pub const SEAL_OVERHEAD: usize = 1 + NONCE_LEN + TAG_LEN;

/// Cipher suites a sealed blob can be tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CipherSuite {
    /// AES-256-GCM, 96-bit random nonce, no associated data
    Aes256GcmV1 = 0x01,
}

impl CipherSuite {
    /// Suite used for every new seal
    pub const CURRENT: CipherSuite = CipherSuite::Aes256GcmV1;

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CipherSuite {
    type Error = VaultError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Aes256GcmV1),
            other => Err(VaultError::Format(format!(
                "unrecognized cipher suite version {:#04x}",
                other
            ))),
        }
    }
}

/// Versioned, nonce-prefixed, tag-suffixed ciphertext
#[derive(Clone, PartialEq, Eq)]
pub struct SealedBlob {
    /// Cipher suite that produced this blob
    pub suite: CipherSuite,
    /// Per-seal random nonce
    pub nonce: [u8; NONCE_LEN],
    /// Encrypted password bytes
    pub ciphertext: Vec<u8>,
    /// Authentication tag
    pub tag: [u8; TAG_LEN],
}

impl SealedBlob {
    /// Parse the binary layout, rejecting short input and unknown versions
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SEAL_OVERHEAD {
            return Err(VaultError::Format(format!(
                "sealed blob is {} bytes, minimum is {}",
                bytes.len(),
                SEAL_OVERHEAD
            )));
        }

        let suite = CipherSuite::try_from(bytes[0])?;

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[1..1 + NONCE_LEN]);

        let tag_start = bytes.len() - TAG_LEN;
        let ciphertext = bytes[1 + NONCE_LEN..tag_start].to_vec();

        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&bytes[tag_start..]);

        Ok(Self {
            suite,
            nonce,
            ciphertext,
            tag,
        })
    }

    /// Serialize to the binary layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(self.suite.as_byte());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    /// Parse the base64 storage form
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| VaultError::Format(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Base64 storage form
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Serialized length in bytes
    pub fn encoded_len(&self) -> usize {
        SEAL_OVERHEAD + self.ciphertext.len()
    }
}

impl std::fmt::Debug for SealedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedBlob")
            .field("suite", &self.suite)
            .field("len", &self.encoded_len())
            .finish()
    }
}

impl Serialize for SealedBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for SealedBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        SealedBlob::from_base64(&encoded).map_err(de::Error::custom)
    }
}

/// Sealed blob in its base64 storage form
///
/// Parsed only when the record is opened, so one damaged record cannot
/// keep the rest of a store from loading.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredBlob(String);

impl StoredBlob {
    /// Wrap a base64 value read from storage
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a [`SealedBlob`], `Format` error if malformed
    pub fn parse(&self) -> Result<SealedBlob> {
        SealedBlob::from_base64(&self.0)
    }

    /// Parse and open in one step
    pub fn open(&self, key: &EncryptionKey) -> Result<SecretString> {
        open(&self.parse()?, key)
    }
}

impl From<&SealedBlob> for StoredBlob {
    fn from(blob: &SealedBlob) -> Self {
        Self(blob.to_base64())
    }
}

impl From<SealedBlob> for StoredBlob {
    fn from(blob: SealedBlob) -> Self {
        Self::from(&blob)
    }
}

impl std::fmt::Debug for StoredBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredBlob")
            .field("base64_len", &self.0.len())
            .finish()
    }
}

/// Seal a password under `key` with a fresh random nonce
pub fn seal(plaintext: &str, key: &EncryptionKey) -> Result<SealedBlob> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut buffer = Zeroizing::new(plaintext.as_bytes().to_vec());
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", buffer.as_mut_slice())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(SealedBlob {
        suite: CipherSuite::CURRENT,
        nonce,
        ciphertext: std::mem::take(&mut *buffer),
        tag: tag_bytes,
    })
}

/// Open a sealed blob, returning the password only if the tag verifies
pub fn open(blob: &SealedBlob, key: &EncryptionKey) -> Result<SecretString> {
    match blob.suite {
        CipherSuite::Aes256GcmV1 => open_aes256gcm_v1(blob, key),
    }
}

/// Parse and open the binary layout in one step
pub fn open_bytes(bytes: &[u8], key: &EncryptionKey) -> Result<SecretString> {
    open(&SealedBlob::from_bytes(bytes)?, key)
}

fn open_aes256gcm_v1(blob: &SealedBlob, key: &EncryptionKey) -> Result<SecretString> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let mut buffer = Zeroizing::new(blob.ciphertext.clone());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&blob.nonce),
            b"",
            buffer.as_mut_slice(),
            Tag::from_slice(&blob.tag),
        )
        .map_err(|_| VaultError::Authentication)?;

    let plaintext = std::str::from_utf8(buffer.as_slice())
        .map_err(|_| VaultError::Format("authenticated plaintext is not UTF-8".to_string()))?;

    Ok(SecretString::new(plaintext.to_owned()))
}
