//! CLI command handlers
//!
//! This module bridges the clap argument parsing with the service layer.

pub mod audit;
pub mod config;
pub mod credential;
pub mod export;
pub mod kdf;
pub mod prompt;
pub mod vault;

pub use audit::handle_audit;
pub use config::{handle_config_command, ConfigCommands};
pub use credential::{handle_credential_command, handle_generate, handle_list, CredentialCommands};
pub use export::{handle_export, handle_export_with_passwords};
pub use kdf::{handle_kdf_command, KdfCommands};
pub use vault::connect;
