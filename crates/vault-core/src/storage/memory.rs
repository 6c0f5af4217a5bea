//! In-memory storage backend

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::records::Records;
use super::CredentialStore;
use crate::credential::{Credential, CredentialChanges, OwnerId};
use crate::crypto::SealedBlob;
use crate::error::Result;

/// Process-local credential store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<Records>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(
        &self,
        owner_id: &OwnerId,
        website: &str,
        username: &str,
        encrypted_password: SealedBlob,
    ) -> Result<Uuid> {
        let id = self
            .records
            .write()
            .await
            .insert(owner_id, website, username, encrypted_password);
        debug!("Saved record {}", id);
        Ok(id)
    }

    async fn list(&self, owner_id: &OwnerId) -> Result<Vec<Credential>> {
        Ok(self.records.read().await.list(owner_id))
    }

    async fn get(&self, id: Uuid, owner_id: &OwnerId) -> Result<Credential> {
        self.records.read().await.get(id, owner_id).cloned()
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: &OwnerId,
        changes: CredentialChanges,
    ) -> Result<Credential> {
        let updated = self.records.write().await.update(id, owner_id, changes)?;
        debug!("Updated record {}", id);
        Ok(updated)
    }

    async fn delete(&self, id: Uuid, owner_id: &OwnerId) -> Result<()> {
        self.records.write().await.remove(id, owner_id)?;
        debug!("Deleted record {}", id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Credential>> {
        Ok(self.records.read().await.all())
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{seal, EncryptionKey};
    use crate::error::VaultError;

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id).unwrap()
    }

    fn blob(password: &str) -> SealedBlob {
        seal(password, &EncryptionKey::new([3u8; 32])).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = MemoryCredentialStore::new();
        let alice = owner("alice");

        let id = store.save(&alice, "github.com", "alice", blob("pw")).await.unwrap();
        let record = store.get(id, &alice).await.unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.website, "github.com");
        assert_eq!(record.owner_id, alice);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let store = MemoryCredentialStore::new();
        let alice = owner("alice");
        let bob = owner("bob");

        store.save(&alice, "a.com", "alice", blob("1")).await.unwrap();
        store.save(&alice, "b.com", "alice", blob("2")).await.unwrap();
        store.save(&bob, "c.com", "bob", blob("3")).await.unwrap();

        let listed = store.list(&alice).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|c| c.owner_id == alice));
        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let store = MemoryCredentialStore::new();
        let result = store.get(Uuid::new_v4(), &owner("alice")).await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_foreign_owner_cannot_update_or_delete() {
        let store = MemoryCredentialStore::new();
        let alice = owner("alice");
        let mallory = owner("mallory");

        let id = store.save(&alice, "bank.com", "alice", blob("pw")).await.unwrap();
        let before = store.get(id, &alice).await.unwrap();

        let changes = CredentialChanges {
            username: Some("mallory".to_string()),
            ..Default::default()
        };
        let result = store.update(id, &mallory, changes).await;
        assert!(matches!(result, Err(VaultError::Forbidden(_))));

        let result = store.delete(id, &mallory).await;
        assert!(matches!(result, Err(VaultError::Forbidden(_))));

        let after = store.get(id, &alice).await.unwrap();
        assert_eq!(after.username, before.username);
        assert_eq!(after.encrypted_password, before.encrypted_password);
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryCredentialStore::new();
        let alice = owner("alice");

        let id = store.save(&alice, "old.com", "alice", blob("pw")).await.unwrap();
        let changes = CredentialChanges {
            website: Some("new.com".to_string()),
            ..Default::default()
        };
        let updated = store.update(id, &alice, changes).await.unwrap();
        assert_eq!(updated.website, "new.com");
        assert_eq!(updated.username, "alice");

        store.delete(id, &alice).await.unwrap();
        assert!(matches!(
            store.delete(id, &alice).await,
            Err(VaultError::NotFound(_))
        ));
    }
}
