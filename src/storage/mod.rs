//! Storage layer for pwdvault
//!
//! Credential rows live in a JSON file under the data directory, written
//! atomically. Lifecycle events go to the audit log next to it.

pub mod credentials;
pub mod file_io;

pub use credentials::CredentialRepository;
pub use file_io::{read_json, write_json_atomic};

use tracing::warn;

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::PwdVaultPaths;
use crate::error::PwdVaultError;

/// Storage coordinator owning the repositories
pub struct Storage {
    pub credentials: CredentialRepository,
    pub audit: AuditLogger,
}

impl Storage {
    /// Create a storage instance, creating directories as needed
    pub fn new(paths: PwdVaultPaths) -> Result<Self, PwdVaultError> {
        paths.ensure_directories()?;

        Ok(Self {
            credentials: CredentialRepository::new(paths.credentials_file()),
            audit: AuditLogger::new(paths.audit_log()),
        })
    }

    /// Create and load in one step
    pub fn open(paths: PwdVaultPaths) -> Result<Self, PwdVaultError> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), PwdVaultError> {
        self.credentials.load()
    }

    /// Append to the audit log
    ///
    /// The operation being recorded has already happened, so a failed write
    /// is reported through tracing rather than returned.
    pub fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.log(&entry) {
            warn!(
                error = %e,
                operation = %entry.operation,
                entity = %entry.entity_id,
                "Failed to write audit entry"
            );
        }
    }
}
