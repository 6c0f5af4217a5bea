//! Out-of-band key rotation
//!
//! Re-seals every stored password under a new key. Records that already open
//! under the new key are skipped, so an interrupted run can simply be
//! repeated. The old key must stay available until this completes.

use tracing::{error, info, warn};

use crate::credential::CredentialChanges;
use crate::crypto::{seal, EncryptionKey};
use crate::error::{Result, VaultError};
use crate::storage::CredentialStore;

/// Outcome of a rotation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationReport {
    /// Records re-sealed under the new key
    pub resealed: usize,
    /// Records that were already sealed under the new key
    pub already_current: usize,
}

impl RotationReport {
    pub fn total(&self) -> usize {
        self.resealed + self.already_current
    }
}

/// Re-seal every record in `store` from `old_key` to `new_key`
pub async fn rotate_key(
    store: &dyn CredentialStore,
    old_key: &EncryptionKey,
    new_key: &EncryptionKey,
) -> Result<RotationReport> {
    if old_key == new_key {
        return Err(VaultError::Configuration(
            "new encryption key is identical to the current key".to_string(),
        ));
    }

    let records = store.list_all().await?;
    info!(
        "Rotating encryption key for {} records in {}",
        records.len(),
        store.backend_name()
    );

    let mut report = RotationReport::default();

    for record in records {
        if record.encrypted_password.open(new_key).is_ok() {
            report.already_current += 1;
            continue;
        }

        let password = record.encrypted_password.open(old_key).map_err(|e| {
            error!(
                "Record {} opens under neither key ({}), aborting rotation",
                record.id,
                e.kind()
            );
            e
        })?;

        let changes = CredentialChanges {
            encrypted_password: Some(seal(password.expose(), new_key)?),
            ..Default::default()
        };
        store.update(record.id, &record.owner_id, changes).await?;
        report.resealed += 1;
    }

    if report.already_current > 0 {
        warn!(
            "{} records were already sealed under the new key",
            report.already_current
        );
    }
    info!("Key rotation complete: {} records re-sealed", report.resealed);
    Ok(report)
}
