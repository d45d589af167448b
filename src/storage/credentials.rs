//! Credential repository for JSON storage
//!
//! Manages loading and saving credential rows to credentials.json. Rows are
//! keyed by application name, since each application has exactly one key in
//! the secret store. Every mutation is persisted immediately; if the write
//! fails the in-memory map is restored and the error returned.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockWriteGuard};

use crate::error::PwdVaultError;
use crate::models::Credential;

use super::file_io::{read_json, write_json_atomic};

/// Serializable credential data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CredentialData {
    credentials: Vec<Credential>,
}

/// Repository for credential persistence
pub struct CredentialRepository {
    path: PathBuf,
    data: RwLock<HashMap<String, Credential>>,
}

impl CredentialRepository {
    /// Create a new credential repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load credentials from disk
    pub fn load(&self) -> Result<(), PwdVaultError> {
        let file_data: CredentialData = read_json(&self.path)?;

        let mut data = self.write_lock()?;
        data.clear();
        for credential in file_data.credentials {
            data.insert(credential.app_name.clone(), credential);
        }

        Ok(())
    }

    /// Save credentials to disk
    pub fn save(&self) -> Result<(), PwdVaultError> {
        let data = self.data.read().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        self.persist(&data)
    }

    /// Get the credential for `app_name`/`user_name`
    pub fn get(&self, app_name: &str, user_name: &str) -> Result<Option<Credential>, PwdVaultError> {
        Ok(self
            .get_by_app(app_name)?
            .filter(|credential| credential.matches(app_name, user_name)))
    }

    /// Get the credential stored for an application, whatever the user
    pub fn get_by_app(&self, app_name: &str) -> Result<Option<Credential>, PwdVaultError> {
        let data = self.data.read().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(app_name).cloned())
    }

    /// Get all credentials sorted by category, then application name
    pub fn get_all(&self) -> Result<Vec<Credential>, PwdVaultError> {
        let data = self.data.read().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut credentials: Vec<_> = data.values().cloned().collect();
        sort_credentials(&mut credentials);
        Ok(credentials)
    }

    /// Insert a new credential; the application must not have one yet
    pub fn insert(&self, credential: Credential) -> Result<(), PwdVaultError> {
        validate(&credential)?;
        let mut data = self.write_lock()?;

        if let Some(existing) = data.get(&credential.app_name) {
            return Err(PwdVaultError::Duplicate {
                entity_type: "Credential",
                identifier: format!("{}/{}", existing.app_name, existing.user_name),
            });
        }

        let app_name = credential.app_name.clone();
        data.insert(app_name.clone(), credential);

        if let Err(e) = self.persist(&data) {
            data.remove(&app_name);
            return Err(e);
        }
        Ok(())
    }

    /// Replace an existing credential row
    pub fn update(&self, credential: Credential) -> Result<(), PwdVaultError> {
        validate(&credential)?;
        let mut data = self.write_lock()?;

        let previous = match data.get(&credential.app_name) {
            Some(existing) if existing.id == credential.id => existing.clone(),
            _ => {
                return Err(PwdVaultError::credential_not_found(
                    &credential.app_name,
                    &credential.user_name,
                ))
            }
        };

        data.insert(credential.app_name.clone(), credential);

        if let Err(e) = self.persist(&data) {
            data.insert(previous.app_name.clone(), previous);
            return Err(e);
        }
        Ok(())
    }

    /// Remove and return the credential for `app_name`/`user_name`
    pub fn remove(&self, app_name: &str, user_name: &str) -> Result<Credential, PwdVaultError> {
        let mut data = self.write_lock()?;

        let removed = match data.get(app_name) {
            Some(existing) if existing.matches(app_name, user_name) => data.remove(app_name),
            _ => None,
        }
        .ok_or_else(|| PwdVaultError::credential_not_found(app_name, user_name))?;

        if let Err(e) = self.persist(&data) {
            data.insert(removed.app_name.clone(), removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Count credentials
    pub fn count(&self) -> Result<usize, PwdVaultError> {
        let data = self.data.read().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.len())
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Credential>>, PwdVaultError> {
        self.data.write().map_err(|e| {
            PwdVaultError::Storage(format!("Failed to acquire write lock: {}", e))
        })
    }

    fn persist(&self, data: &HashMap<String, Credential>) -> Result<(), PwdVaultError> {
        let mut credentials: Vec<_> = data.values().cloned().collect();
        sort_credentials(&mut credentials);

        let file_data = CredentialData { credentials };
        write_json_atomic(&self.path, &file_data)
    }
}

fn validate(credential: &Credential) -> Result<(), PwdVaultError> {
    credential
        .validate()
        .map_err(|e| PwdVaultError::InvalidArgument(e.to_string()))
}

fn sort_credentials(credentials: &mut [Credential]) {
    credentials.sort_by(|a, b| {
        a.app_category
            .to_lowercase()
            .cmp(&b.app_category.to_lowercase())
            .then_with(|| a.app_name.to_lowercase().cmp(&b.app_name.to_lowercase()))
    });
}
