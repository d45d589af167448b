//! Secret store abstraction
//!
//! Mirrors the four KV version 2 operations the key lifecycle needs. Paths
//! are relative to the secrets engine mount.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::PwdVaultResult;

/// Field holding the key bytes (base64) in every secret
pub const DATA_KEY: &str = "encryption_key";

/// Data map of one secret version
pub type SecretData = Map<String, Value>;

/// Latest version of a secret as returned by [`SecretStore::read`]
#[derive(Debug, Clone)]
pub struct SecretEntry {
    pub data: SecretData,
    pub version: u64,
}

/// A versioned key/value secret store
///
/// Implementations report a missing secret as `KeyNotFound`, a failed
/// check-and-set as `KeyConflict`, and transport or authentication problems
/// as `VaultUnavailable`. The identifier carried by those errors is the path.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Write `data` only if the current version equals `cas` (0 = absent)
    async fn write_cas(&self, path: &str, data: &SecretData, cas: u64) -> PwdVaultResult<u64>;

    /// Fetch the latest version
    async fn read(&self, path: &str) -> PwdVaultResult<SecretEntry>;

    /// Merge `data` into the latest version, creating a new version
    async fn patch(&self, path: &str, data: &SecretData) -> PwdVaultResult<u64>;

    /// Remove metadata and every version; succeeds if nothing is there
    async fn destroy(&self, path: &str) -> PwdVaultResult<()>;
}
