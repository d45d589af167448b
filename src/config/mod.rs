//! Configuration module for pwdvault
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Vault connection and key derivation settings

pub mod paths;
pub mod settings;

pub use paths::PwdVaultPaths;
pub use settings::{RetrySettings, Settings, VaultSettings};
