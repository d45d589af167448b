//! In-process secret store with KV version 2 semantics
//!
//! Keeps every version of every secret, honours check-and-set, and can be
//! told to fail the next N calls to exercise outage handling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{PwdVaultError, PwdVaultResult};

use super::store::{SecretData, SecretEntry, SecretStore};

#[derive(Debug, Default)]
struct VersionedSecret {
    versions: Vec<SecretData>,
}

impl VersionedSecret {
    fn current_version(&self) -> u64 {
        self.versions.len() as u64
    }
}

/// Secret store held entirely in memory
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, VersionedSecret>>,
    failures_remaining: AtomicU32,
    destroy_failures_remaining: AtomicU32,
}

impl MemorySecretStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls fail with `VaultUnavailable`
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` destroy calls fail with `VaultUnavailable`
    pub fn fail_next_destroy(&self, count: u32) {
        self.destroy_failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Number of versions stored at `path` (0 when absent)
    pub fn version_count(&self, path: &str) -> PwdVaultResult<u64> {
        let secrets = self.secrets.read().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(secrets.get(path).map_or(0, VersionedSecret::current_version))
    }

    /// Check whether anything is stored at `path`
    pub fn contains(&self, path: &str) -> PwdVaultResult<bool> {
        Ok(self.version_count(path)? > 0)
    }

    fn check_available(&self) -> PwdVaultResult<()> {
        take_failure(&self.failures_remaining)
    }
}

fn take_failure(counter: &AtomicU32) -> PwdVaultResult<()> {
    let injected = counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if injected {
        return Err(PwdVaultError::VaultUnavailable(
            "injected outage".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn write_cas(&self, path: &str, data: &SecretData, cas: u64) -> PwdVaultResult<u64> {
        self.check_available()?;
        let mut secrets = self.secrets.write().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let secret = secrets.entry(path.to_string()).or_default();
        if secret.current_version() != cas {
            return Err(PwdVaultError::KeyConflict(path.to_string()));
        }
        secret.versions.push(data.clone());
        Ok(secret.current_version())
    }

    async fn read(&self, path: &str) -> PwdVaultResult<SecretEntry> {
        self.check_available()?;
        let secrets = self.secrets.read().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        secrets
            .get(path)
            .and_then(|secret| {
                secret.versions.last().map(|data| SecretEntry {
                    data: data.clone(),
                    version: secret.current_version(),
                })
            })
            .ok_or_else(|| PwdVaultError::KeyNotFound(path.to_string()))
    }

    async fn patch(&self, path: &str, data: &SecretData) -> PwdVaultResult<u64> {
        self.check_available()?;
        let mut secrets = self.secrets.write().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let secret = secrets
            .get_mut(path)
            .filter(|secret| !secret.versions.is_empty())
            .ok_or_else(|| PwdVaultError::KeyNotFound(path.to_string()))?;

        let mut merged = secret.versions.last().cloned().unwrap_or_default();
        for (field, value) in data {
            merged.insert(field.clone(), value.clone());
        }
        secret.versions.push(merged);
        Ok(secret.current_version())
    }

    async fn destroy(&self, path: &str) -> PwdVaultResult<()> {
        self.check_available()?;
        take_failure(&self.destroy_failures_remaining)?;
        let mut secrets = self.secrets.write().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        secrets.remove(path);
        Ok(())
    }
}
