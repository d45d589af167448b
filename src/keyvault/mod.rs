//! Per-application encryption keys in an external secret store
//!
//! [`KeyVaultController`] owns the key lifecycle and talks to any
//! [`SecretStore`]. [`HttpSecretStore`] speaks HashiCorp Vault's KV version 2
//! API; [`MemorySecretStore`] provides the same semantics in-process.

pub mod client;
pub mod controller;
pub mod http;
pub mod memory;
pub mod store;

pub use client::{VaultClientCell, VaultController};
pub use controller::{validate_app_name, KeyVaultController, RetryConfig};
pub use http::{AppRoleCredentials, HttpSecretStore};
pub use memory::MemorySecretStore;
pub use store::{SecretData, SecretEntry, SecretStore};
