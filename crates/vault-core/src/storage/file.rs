//! JSON file storage backend
//!
//! Keeps every record in one `credentials.json` document in the data
//! directory. Passwords are already sealed when they arrive here, so the
//! file holds only base64 sealed blobs next to the plain metadata.

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, error};
use uuid::Uuid;

use super::records::Records;
use super::CredentialStore;
use crate::credential::{Credential, CredentialChanges, OwnerId};
use crate::crypto::SealedBlob;
use crate::error::{Result, VaultError};

/// Current file format version
const FILE_VERSION: u32 = 1;

/// File format for persistent storage
#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    records: Records,
}

/// File-backed credential store
pub struct FileCredentialStore {
    /// Directory for storage files
    storage_dir: PathBuf,
    /// In-memory copy of the file contents
    records: RwLock<Records>,
}

impl FileCredentialStore {
    /// Create a store in the platform data directory
    pub fn new() -> Result<Self> {
        Self::with_dir(Self::default_dir()?)
    }

    /// Create with a custom storage directory
    pub fn with_dir(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;

        debug!("File credential storage initialized at: {:?}", storage_dir);

        Ok(Self {
            storage_dir,
            records: RwLock::new(Records::default()),
        })
    }

    /// Create and load in one step
    pub async fn open(storage_dir: PathBuf) -> Result<Self> {
        let store = Self::with_dir(storage_dir)?;
        store.load().await?;
        Ok(store)
    }

    /// Get the default storage directory
    pub fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "passvault", "passvault")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| VaultError::Storage("Could not determine data directory".to_string()))
    }

    /// Get the path to the storage file
    pub fn storage_file_path(&self) -> PathBuf {
        self.storage_dir.join("credentials.json")
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Load records from disk, replacing anything in memory
    pub async fn load(&self) -> Result<()> {
        let path = self.storage_file_path();

        if !path.exists() {
            debug!("No existing storage file found");
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let file: StorageFile = serde_json::from_str(&contents)?;

        if file.version != FILE_VERSION {
            return Err(VaultError::Storage(format!(
                "unsupported storage file version {}",
                file.version
            )));
        }

        let mut records = self.records.write().await;
        *records = file.records;

        debug!("Loaded {} records from storage", records.len());
        Ok(())
    }

    /// Write a snapshot atomically using a temp file
    async fn persist(&self, records: &Records) -> Result<()> {
        let file = StorageFile {
            version: FILE_VERSION,
            records: records.clone(),
        };

        let contents = serde_json::to_string_pretty(&file)?;
        let path = self.storage_file_path();

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Saved {} records to storage", records.len());
        Ok(())
    }

    /// Run a mutation on a copy, persist it, then commit it in memory
    async fn mutate<T>(&self, op: impl FnOnce(&mut Records) -> Result<T>) -> Result<T> {
        let mut records = self.records.write().await;
        let mut next = records.clone();
        let value = op(&mut next)?;

        if let Err(e) = self.persist(&next).await {
            error!("Failed to persist credential storage: {}", e);
            return Err(e);
        }

        *records = next;
        Ok(value)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn save(
        &self,
        owner_id: &OwnerId,
        website: &str,
        username: &str,
        encrypted_password: SealedBlob,
    ) -> Result<Uuid> {
        let id = self
            .mutate(|records| Ok(records.insert(owner_id, website, username, encrypted_password)))
            .await?;
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
        let updated = self
            .mutate(|records| records.update(id, owner_id, changes))
            .await?;
        debug!("Updated record {}", id);
        Ok(updated)
    }

    async fn delete(&self, id: Uuid, owner_id: &OwnerId) -> Result<()> {
        self.mutate(|records| records.remove(id, owner_id)).await?;
        debug!("Deleted record {}", id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Credential>> {
        Ok(self.records.read().await.all())
    }

    fn backend_name(&self) -> &'static str {
        "JSON File Storage"
    }
}
