//! Per-application key lifecycle against the secret store
//!
//! Each application name owns exactly one secret at `base_path + app_name`
//! holding `{ "encryption_key": <base64 key bytes> }`.
//!
//! Concurrent `create_key` calls for one name are safe: the check-and-set
//! write lets exactly one through and the rest see `KeyConflict`.
//! `rotate_key` is not versioned, so concurrent rotations of the same name
//! are last-write-wins. A `delete_key` racing a rotate or read can make the
//! loser see `KeyNotFound`.

use std::future::Future;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::crypto::encryption::VALID_KEY_SIZES;
use crate::crypto::SecureBytes;
use crate::error::{PwdVaultError, PwdVaultResult};

use super::store::{SecretData, SecretStore, DATA_KEY};

/// Bounded exponential backoff for transient secret store failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

/// Creates, reads, rotates and destroys application keys
#[derive(Debug)]
pub struct KeyVaultController<S> {
    store: S,
    base_path: String,
    retry: RetryConfig,
}

impl<S: SecretStore> KeyVaultController<S> {
    /// Create a controller writing under `base_path`
    pub fn new(store: S, base_path: impl Into<String>) -> Self {
        Self {
            store,
            base_path: base_path.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Access the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Path of the secret holding `app_name`'s key
    pub fn secret_path(&self, app_name: &str) -> PwdVaultResult<String> {
        validate_app_name(app_name)?;
        Ok(format!("{}{}", self.base_path, app_name))
    }

    /// Store the first key for `app_name`; fails with `KeyConflict` if one exists
    pub async fn create_key(&self, app_name: &str, key: &[u8]) -> PwdVaultResult<u64> {
        validate_key(key)?;
        let path = self.secret_path(app_name)?;
        let data = key_payload(key);

        match self
            .retrying("create", || self.store.write_cas(&path, &data, 0))
            .await
        {
            Ok(version) => {
                info!(app = app_name, version, "Created encryption key");
                Ok(version)
            }
            Err(PwdVaultError::KeyConflict(_)) => {
                // A retried write can collide with its own earlier attempt
                // whose response was lost; that key is byte-identical to ours.
                let entry = self
                    .retrying("read", || self.store.read(&path))
                    .await
                    .map_err(|e| rename(e, app_name))?;
                if entry_matches(&entry.data, key) {
                    info!(app = app_name, version = entry.version, "Created encryption key");
                    return Ok(entry.version);
                }
                debug!(app = app_name, "Encryption key already exists");
                Err(PwdVaultError::KeyConflict(app_name.to_string()))
            }
            Err(e) => Err(rename(e, app_name)),
        }
    }

    /// Fetch the live key for `app_name`
    pub async fn read_key(&self, app_name: &str) -> PwdVaultResult<SecureBytes> {
        let path = self.secret_path(app_name)?;
        let entry = self
            .retrying("read", || self.store.read(&path))
            .await
            .map_err(|e| rename(e, app_name))?;

        debug!(app = app_name, version = entry.version, "Read encryption key");
        decode_key(&entry.data, app_name)
    }

    /// Replace the live key for `app_name`, keeping metadata and history
    pub async fn rotate_key(&self, app_name: &str, new_key: &[u8]) -> PwdVaultResult<u64> {
        validate_key(new_key)?;
        let path = self.secret_path(app_name)?;
        let data = key_payload(new_key);

        let version = self
            .retrying("rotate", || self.store.patch(&path, &data))
            .await
            .map_err(|e| rename(e, app_name))?;

        info!(app = app_name, version, "Rotated encryption key");
        Ok(version)
    }

    /// Destroy every version of `app_name`'s key; absent keys count as success
    pub async fn delete_key(&self, app_name: &str) -> PwdVaultResult<()> {
        let path = self.secret_path(app_name)?;
        match self.retrying("delete", || self.store.destroy(&path)).await {
            Ok(()) | Err(PwdVaultError::KeyNotFound(_)) => {
                info!(app = app_name, "Destroyed encryption key");
                Ok(())
            }
            Err(e) => Err(rename(e, app_name)),
        }
    }

    async fn retrying<T, F, Fut>(&self, operation: &str, mut call: F) -> PwdVaultResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PwdVaultResult<T>>,
    {
        let mut attempt = 1;
        let mut delay = self.retry.base_delay;

        loop {
            match call().await {
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "Secret store call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.retry.max_delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Reject names that could escape `base_path` in the store's namespace
pub fn validate_app_name(app_name: &str) -> PwdVaultResult<()> {
    if app_name.trim().is_empty() {
        return Err(PwdVaultError::InvalidArgument(
            "Application name cannot be empty".into(),
        ));
    }
    if app_name != app_name.trim() {
        return Err(PwdVaultError::InvalidArgument(
            "Application name cannot start or end with whitespace".into(),
        ));
    }
    if app_name.contains(['/', '\\']) || app_name == "." || app_name.contains("..") {
        return Err(PwdVaultError::InvalidArgument(format!(
            "Application name contains path characters: '{}'",
            app_name
        )));
    }
    if app_name.chars().any(char::is_control) {
        return Err(PwdVaultError::InvalidArgument(
            "Application name contains control characters".into(),
        ));
    }
    Ok(())
}

fn validate_key(key: &[u8]) -> PwdVaultResult<()> {
    if !VALID_KEY_SIZES.contains(&key.len()) {
        return Err(PwdVaultError::InvalidArgument(format!(
            "Invalid key size: {} bytes (expected 16, 24 or 32)",
            key.len()
        )));
    }
    Ok(())
}

fn key_payload(key: &[u8]) -> SecretData {
    let mut data = SecretData::new();
    data.insert(DATA_KEY.to_string(), Value::String(STANDARD.encode(key)));
    data
}

fn decode_key(data: &SecretData, app_name: &str) -> PwdVaultResult<SecureBytes> {
    let encoded = data
        .get(DATA_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| PwdVaultError::KeyNotFound(app_name.to_string()))?;

    STANDARD
        .decode(encoded)
        .map(SecureBytes::new)
        .map_err(|_| PwdVaultError::Crypto(format!("Malformed key payload for '{}'", app_name)))
}

fn entry_matches(data: &SecretData, key: &[u8]) -> bool {
    data.get(DATA_KEY).and_then(Value::as_str) == Some(STANDARD.encode(key).as_str())
}

/// Swap the store path in key errors for the application name
fn rename(err: PwdVaultError, app_name: &str) -> PwdVaultError {
    match err {
        PwdVaultError::KeyConflict(_) => PwdVaultError::KeyConflict(app_name.to_string()),
        PwdVaultError::KeyNotFound(_) => PwdVaultError::KeyNotFound(app_name.to_string()),
        other => other,
    }
}
