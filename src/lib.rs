//! pwdvault - personal credential vault backed by HashiCorp Vault
//!
//! Application passwords are encrypted with AES-GCM under a random data key
//! per application. The data keys live in a KV version 2 secrets engine; the
//! local store only ever holds ciphertext, nonce and metadata.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and the JSON settings file
//! - `error`: Custom error types
//! - `crypto`: Encryption, key derivation and zeroizing containers
//! - `keyvault`: Secret store contract, Vault HTTP client and key controller
//! - `models`: Credential rows and ids
//! - `storage`: JSON file storage layer
//! - `audit`: Audit logging system
//! - `services`: Credential lifecycle and password helpers
//! - `export`: CSV export of credential rows
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use pwdvault::keyvault::{KeyVaultController, MemorySecretStore};
//! use pwdvault::services::CredentialService;
//! use pwdvault::storage::Storage;
//!
//! let storage = Storage::open(paths)?;
//! let vault = KeyVaultController::new(MemorySecretStore::new(), "pwdvault/");
//! let service = CredentialService::new(&storage, &vault);
//! service.create(None, "github", "alice", "s3cret!Pass").await?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod export;
pub mod keyvault;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{PwdVaultError, PwdVaultResult};
