//! Credential type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{SealedBlob, SecretString, StoredBlob};
use crate::error::{Result, VaultError};

/// Identifier of the authenticated user that owns a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Create an owner id, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(VaultError::Validation("owner id is empty".to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored credential record (password sealed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Store-assigned identifier
    pub id: Uuid,

    /// Owning user, fixed at creation
    pub owner_id: OwnerId,

    /// Website or service the login belongs to
    pub website: String,

    /// Login name
    pub username: String,

    /// Sealed password in base64, parsed when opened
    pub encrypted_password: StoredBlob,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a credential
#[derive(Clone, Deserialize)]
pub struct NewCredential {
    pub website: String,
    pub username: String,
    pub password: String,
}

impl NewCredential {
    pub fn new(website: &str, username: &str, password: &str) -> Self {
        Self {
            website: website.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// All three fields are required and must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.website.is_empty() || self.username.is_empty() || self.password.is_empty() {
            return Err(VaultError::Validation(
                "Missing required fields".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewCredential")
            .field("website", &self.website)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Partial update of a credential; empty strings are treated as absent
#[derive(Clone, Default, Deserialize)]
pub struct CredentialUpdate {
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialUpdate {
    pub fn website(&self) -> Option<&str> {
        non_empty(&self.website)
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }

    /// At least one field must carry a value
    pub fn validate(&self) -> Result<()> {
        if self.website().is_none() && self.username().is_none() && self.password().is_none() {
            return Err(VaultError::Validation(
                "Missing required fields".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for CredentialUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialUpdate")
            .field("website", &self.website)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Field changes as the store sees them - the password is already sealed
#[derive(Debug, Clone, Default)]
pub struct CredentialChanges {
    pub website: Option<String>,
    pub username: Option<String>,
    pub encrypted_password: Option<SealedBlob>,
}

impl CredentialChanges {
    /// Apply these changes to a record, bumping `updated_at`
    pub fn apply_to(self, credential: &mut Credential) {
        if let Some(website) = self.website {
            credential.website = website;
        }
        if let Some(username) = self.username {
            credential.username = username;
        }
        if let Some(blob) = self.encrypted_password {
            credential.encrypted_password = blob.into();
        }
        credential.updated_at = Utc::now();
    }
}

/// Credential with its password opened for the owning caller
pub struct DecryptedCredential {
    pub id: Uuid,
    pub website: String,
    pub username: String,
    /// Plaintext password, zeroed on drop
    pub password: SecretString,
}

impl std::fmt::Debug for DecryptedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedCredential")
            .field("id", &self.id)
            .field("website", &self.website)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
