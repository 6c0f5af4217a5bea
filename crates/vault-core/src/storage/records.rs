//! Owner-checked record map shared by the store backends

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::credential::{Credential, CredentialChanges, OwnerId};
use crate::crypto::SealedBlob;
use crate::error::{Result, VaultError};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Records {
    entries: HashMap<Uuid, Credential>,
}

impl Records {
    pub(crate) fn insert(
        &mut self,
        owner_id: &OwnerId,
        website: &str,
        username: &str,
        encrypted_password: SealedBlob,
    ) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            Credential {
                id,
                owner_id: owner_id.clone(),
                website: website.to_string(),
                username: username.to_string(),
                encrypted_password: encrypted_password.into(),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub(crate) fn list(&self, owner_id: &OwnerId) -> Vec<Credential> {
        let mut owned: Vec<Credential> = self
            .entries
            .values()
            .filter(|c| &c.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        owned
    }

    pub(crate) fn all(&self) -> Vec<Credential> {
        let mut all: Vec<Credential> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    pub(crate) fn get(&self, id: Uuid, owner_id: &OwnerId) -> Result<&Credential> {
        let credential = self
            .entries
            .get(&id)
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;
        if &credential.owner_id != owner_id {
            return Err(VaultError::Forbidden(id.to_string()));
        }
        Ok(credential)
    }

    pub(crate) fn update(
        &mut self,
        id: Uuid,
        owner_id: &OwnerId,
        changes: CredentialChanges,
    ) -> Result<Credential> {
        self.get(id, owner_id)?;
        let credential = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;
        changes.apply_to(credential);
        Ok(credential.clone())
    }

    pub(crate) fn remove(&mut self, id: Uuid, owner_id: &OwnerId) -> Result<Credential> {
        self.get(id, owner_id)?;
        self.entries
            .remove(&id)
            .ok_or_else(|| VaultError::NotFound(id.to_string()))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
