//! Credential service for owner-scoped CRUD operations
//!
//! Passwords are sealed before any store call and opened only on the way
//! back to the owning caller. Nothing here logs or caches plaintext.

use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::types::{
    Credential, CredentialChanges, CredentialUpdate, DecryptedCredential, NewCredential, OwnerId,
};
use crate::crypto::{seal, KeyProvider};
use crate::error::Result;
use crate::storage::CredentialStore;

/// Credential service
#[derive(Clone)]
pub struct CredentialService {
    /// Storage backend
    store: Arc<dyn CredentialStore>,
    /// Key source, read-only after startup
    keys: Arc<dyn KeyProvider>,
}

impl CredentialService {
    /// Create a new credential service
    pub fn new(store: Arc<dyn CredentialStore>, keys: Arc<dyn KeyProvider>) -> Self {
        Self { store, keys }
    }

    /// Storage backend in use
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Add a new credential
    pub async fn add(&self, owner_id: &OwnerId, new: NewCredential) -> Result<Credential> {
        new.validate()?;

        let key = self.keys.get_key()?;
        let blob = seal(&new.password, key)?;

        let id = self
            .store
            .save(owner_id, &new.website, &new.username, blob)
            .await?;
        let credential = self.store.get(id, owner_id).await?;

        info!("Added credential {} for {}", id, owner_id);
        Ok(credential)
    }

    /// List the owner's credentials with passwords opened
    pub async fn list(&self, owner_id: &OwnerId) -> Result<Vec<DecryptedCredential>> {
        let key = self.keys.get_key()?;
        let records = self.store.list(owner_id).await?;

        let mut credentials = Vec::with_capacity(records.len());
        for record in records {
            let password = record.encrypted_password.open(key).map_err(|e| {
                error!("Failed to open credential {} ({})", record.id, e.kind());
                e
            })?;

            credentials.push(DecryptedCredential {
                id: record.id,
                website: record.website,
                username: record.username,
                password,
            });
        }

        debug!("Listed {} credentials for {}", credentials.len(), owner_id);
        Ok(credentials)
    }

    /// Get one credential with its password opened
    pub async fn get(&self, owner_id: &OwnerId, id: Uuid) -> Result<DecryptedCredential> {
        let key = self.keys.get_key()?;
        let record = self.store.get(id, owner_id).await?;

        let password = record.encrypted_password.open(key).map_err(|e| {
            error!("Failed to open credential {} ({})", record.id, e.kind());
            e
        })?;

        Ok(DecryptedCredential {
            id: record.id,
            website: record.website,
            username: record.username,
            password,
        })
    }

    /// Update any subset of website, username and password
    pub async fn update(
        &self,
        owner_id: &OwnerId,
        id: Uuid,
        update: CredentialUpdate,
    ) -> Result<Credential> {
        update.validate()?;

        let encrypted_password = match update.password() {
            Some(password) => Some(seal(password, self.keys.get_key()?)?),
            None => None,
        };

        let changes = CredentialChanges {
            website: update.website().map(str::to_string),
            username: update.username().map(str::to_string),
            encrypted_password,
        };

        let credential = self.store.update(id, owner_id, changes).await?;

        info!("Updated credential {} for {}", id, owner_id);
        Ok(credential)
    }

    /// Delete a credential
    pub async fn delete(&self, owner_id: &OwnerId, id: Uuid) -> Result<()> {
        self.store.delete(id, owner_id).await?;

        info!("Deleted credential {} for {}", id, owner_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{EncryptionKey, StaticKeyProvider};
    use crate::error::VaultError;
    use crate::storage::{FileCredentialStore, MemoryCredentialStore};
    use tempfile::TempDir;

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id).unwrap()
    }

    fn test_service() -> CredentialService {
        let keys = StaticKeyProvider::new(EncryptionKey::new([7u8; 32]));
        CredentialService::new(Arc::new(MemoryCredentialStore::new()), Arc::new(keys))
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let service = test_service();
        let alice = owner("alice");

        let cred = service
            .add(&alice, NewCredential::new("github.com", "octocat", "ghp_secret"))
            .await
            .unwrap();
        assert_eq!(cred.website, "github.com");
        assert_eq!(cred.owner_id, alice);

        let listed = service.list(&alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, cred.id);
        assert_eq!(listed[0].password.expose(), "ghp_secret");
    }

    #[tokio::test]
    async fn test_add_rejects_missing_fields() {
        let service = test_service();
        let result = service
            .add(&owner("alice"), NewCredential::new("github.com", "", "pw"))
            .await;
        assert!(matches!(result, Err(VaultError::Validation(_))));
        assert!(service.list(&owner("alice")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_blob_is_not_plaintext() {
        let service = test_service();
        let alice = owner("alice");

        let cred = service
            .add(&alice, NewCredential::new("a.com", "alice", "plain-password"))
            .await
            .unwrap();

        let bytes = cred.encrypted_password.parse().unwrap().to_bytes();
        assert!(!bytes
            .windows("plain-password".len())
            .any(|w| w == "plain-password".as_bytes()));
    }

    #[tokio::test]
    async fn test_update_password_reseals_with_fresh_nonce() {
        let service = test_service();
        let alice = owner("alice");

        let cred = service
            .add(&alice, NewCredential::new("a.com", "alice", "same"))
            .await
            .unwrap();

        let update = CredentialUpdate {
            password: Some("same".to_string()),
            ..Default::default()
        };
        let updated = service.update(&alice, cred.id, update).await.unwrap();

        assert_ne!(
            updated.encrypted_password.parse().unwrap().nonce,
            cred.encrypted_password.parse().unwrap().nonce
        );
        assert_eq!(service.get(&alice, cred.id).await.unwrap().password.expose(), "same");
    }

    #[tokio::test]
    async fn test_update_metadata_keeps_blob() {
        let service = test_service();
        let alice = owner("alice");

        let cred = service
            .add(&alice, NewCredential::new("a.com", "alice", "pw"))
            .await
            .unwrap();

        let update = CredentialUpdate {
            website: Some("b.com".to_string()),
            password: Some(String::new()),
            ..Default::default()
        };
        let updated = service.update(&alice, cred.id, update).await.unwrap();

        assert_eq!(updated.website, "b.com");
        assert_eq!(updated.encrypted_password, cred.encrypted_password);
    }

    #[tokio::test]
    async fn test_ownership_scenario() {
        let service = test_service();
        let alice = owner("user_a");
        let bob = owner("user_b");

        let cred = service
            .add(&alice, NewCredential::new("bank.com", "alice", "alice-pw"))
            .await
            .unwrap();

        let update = CredentialUpdate {
            password: Some("bob-pw".to_string()),
            ..Default::default()
        };
        let result = service.update(&bob, cred.id, update).await;
        assert!(matches!(result, Err(VaultError::Forbidden(_))));

        let result = service.delete(&bob, cred.id).await;
        assert!(matches!(result, Err(VaultError::Forbidden(_))));

        let result = service.get(&bob, cred.id).await;
        assert!(matches!(result, Err(VaultError::Forbidden(_))));
        assert!(service.list(&bob).await.unwrap().is_empty());

        let unchanged = service.get(&alice, cred.id).await.unwrap();
        assert_eq!(unchanged.password.expose(), "alice-pw");
        assert_eq!(unchanged.username, "alice");
    }

    #[tokio::test]
    async fn test_delete() {
        let service = test_service();
        let alice = owner("alice");

        let cred = service
            .add(&alice, NewCredential::new("a.com", "alice", "pw"))
            .await
            .unwrap();
        service.delete(&alice, cred.id).await.unwrap();

        assert!(matches!(
            service.get(&alice, cred.id).await,
            Err(VaultError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_key_surfaces_authentication_error() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let alice = owner("alice");

        let writer = CredentialService::new(
            store.clone(),
            Arc::new(StaticKeyProvider::new(EncryptionKey::new([1u8; 32]))),
        );
        writer
            .add(&alice, NewCredential::new("a.com", "alice", "pw"))
            .await
            .unwrap();

        let reader = CredentialService::new(
            store,
            Arc::new(StaticKeyProvider::new(EncryptionKey::new([2u8; 32]))),
        );
        let result = reader.list(&alice).await;
        assert!(matches!(result, Err(VaultError::Authentication)));
    }

    #[tokio::test]
    async fn test_end_to_end_correct_horse() {
        let temp_dir = TempDir::new().unwrap();
        let keys = Arc::new(StaticKeyProvider::from_encoded(&"42".repeat(32)).unwrap());
        let alice = owner("alice");

        let id = {
            let store = FileCredentialStore::open(temp_dir.path().to_path_buf()).await.unwrap();
            let service = CredentialService::new(Arc::new(store), keys.clone());
            service
                .add(
                    &alice,
                    NewCredential::new("xkcd.com", "randall", "correct horse battery staple"),
                )
                .await
                .unwrap()
                .id
        };

        let persisted = std::fs::read(temp_dir.path().join("credentials.json")).unwrap();
        assert!(!String::from_utf8_lossy(&persisted).contains("correct horse battery staple"));

        let store = FileCredentialStore::open(temp_dir.path().to_path_buf()).await.unwrap();
        let service = CredentialService::new(Arc::new(store), keys);
        let opened = service.get(&alice, id).await.unwrap();
        assert_eq!(opened.password.expose(), "correct horse battery staple");
    }

    #[tokio::test]
    async fn test_damaged_record_fails_alone_with_format_error() {
        let temp_dir = TempDir::new().unwrap();
        let keys = Arc::new(StaticKeyProvider::new(EncryptionKey::new([9u8; 32])));
        let alice = owner("alice");
        let bob = owner("bob");

        let bob_id = {
            let store = FileCredentialStore::open(temp_dir.path().to_path_buf()).await.unwrap();
            let service = CredentialService::new(Arc::new(store), keys.clone());
            service
                .add(&alice, NewCredential::new("a.com", "alice", "alice-pw"))
                .await
                .unwrap();
            service
                .add(&bob, NewCredential::new("b.com", "bob", "bob-pw"))
                .await
                .unwrap()
                .id
        };

        let path = temp_dir.path().join("credentials.json");
        let mut doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        doc["records"][bob_id.to_string()]["encrypted_password"] = "AQID".into();
        std::fs::write(&path, doc.to_string()).unwrap();

        let store = FileCredentialStore::open(temp_dir.path().to_path_buf()).await.unwrap();
        let service = CredentialService::new(Arc::new(store), keys);

        let listed = service.list(&alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].password.expose(), "alice-pw");

        let result = service.get(&bob, bob_id).await;
        assert!(matches!(result, Err(VaultError::Format(_))));
    }
}
