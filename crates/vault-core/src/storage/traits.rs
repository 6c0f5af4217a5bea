//! Storage trait definitions

use crate::credential::{Credential, CredentialChanges, OwnerId};
use crate::crypto::SealedBlob;
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence boundary for credential records
///
/// Every call that touches an existing record carries the caller's owner id.
/// A record owned by someone else yields `VaultError::Forbidden` and is left
/// unchanged; an unknown id yields `VaultError::NotFound`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new record and return its id
    async fn save(
        &self,
        owner_id: &OwnerId,
        website: &str,
        username: &str,
        encrypted_password: SealedBlob,
    ) -> Result<Uuid>;

    /// List the owner's records, oldest first
    async fn list(&self, owner_id: &OwnerId) -> Result<Vec<Credential>>;

    /// Fetch one record
    async fn get(&self, id: Uuid, owner_id: &OwnerId) -> Result<Credential>;

    /// Apply field changes and return the updated record
    async fn update(
        &self,
        id: Uuid,
        owner_id: &OwnerId,
        changes: CredentialChanges,
    ) -> Result<Credential>;

    /// Remove a record
    async fn delete(&self, id: Uuid, owner_id: &OwnerId) -> Result<()>;

    /// Every record regardless of owner (key rotation only)
    async fn list_all(&self) -> Result<Vec<Credential>>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
