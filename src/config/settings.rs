//! User settings for pwdvault
//!
//! Holds the Vault connection and the key derivation cost parameters. The
//! AppRole secret id is never written here; it comes from the environment or
//! an interactive prompt.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::PwdVaultPaths;
use crate::crypto::key_derivation::KeyDerivationParams;
use crate::error::PwdVaultError;
use crate::keyvault::controller::RetryConfig;

/// Overrides `vault.server_uri`
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";
/// Overrides `vault.role_id`
pub const ROLE_ID_ENV: &str = "PWDVAULT_ROLE_ID";
/// Supplies the AppRole secret id
pub const SECRET_ID_ENV: &str = "PWDVAULT_SECRET_ID";

/// Retry policy for transient secret store failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetrySettings {
    /// Convert to the controller's retry policy; at least one attempt is made
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Connection settings for the HashiCorp Vault server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSettings {
    /// Server address, e.g. `https://vault.example.com:8200`
    #[serde(default = "default_server_uri")]
    pub server_uri: String,

    /// AppRole role id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,

    /// KV version 2 secrets engine mount
    #[serde(default = "default_mount")]
    pub mount: String,

    /// Prefix prepended to application names inside the mount
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// AppRole auth method mount
    #[serde(default = "default_approle_mount")]
    pub approle_mount: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            server_uri: default_server_uri(),
            role_id: None,
            mount: default_mount(),
            base_path: default_base_path(),
            approle_mount: default_approle_mount(),
            timeout_secs: default_timeout_secs(),
            retry: RetrySettings::default(),
        }
    }
}

/// User settings for pwdvault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub vault: VaultSettings,

    /// Argon2id cost parameters
    #[serde(default)]
    pub kdf: KeyDerivationParams,
}

fn default_schema_version() -> u32 {
    1
}

fn default_server_uri() -> String {
    "http://127.0.0.1:8200".to_string()
}

fn default_mount() -> String {
    "secret".to_string()
}

fn default_base_path() -> String {
    "pwdvault/".to_string()
}

fn default_approle_mount() -> String {
    "approle".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            vault: VaultSettings::default(),
            kdf: KeyDerivationParams::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or default settings if the file doesn't exist
    pub fn load_or_create(paths: &PwdVaultPaths) -> Result<Self, PwdVaultError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                PwdVaultError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                PwdVaultError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Copy with `VAULT_ADDR` / `PWDVAULT_ROLE_ID` from the process
    /// environment applied; the file settings stay untouched
    pub fn with_env_overrides(&self) -> Self {
        let mut effective = self.clone();
        effective.apply_overrides(|name| std::env::var(name).ok());
        effective
    }

    /// Apply overrides from `lookup`; empty values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(addr) = get(VAULT_ADDR_ENV) {
            self.vault.server_uri = addr;
        }
        if let Some(role_id) = get(ROLE_ID_ENV) {
            self.vault.role_id = Some(role_id);
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &PwdVaultPaths) -> Result<(), PwdVaultError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            PwdVaultError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            PwdVaultError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}
