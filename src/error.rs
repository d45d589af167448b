//! Custom error types for pwdvault
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// Message shown to the operator for any internal failure.
///
/// The typed error is logged; this text is what gets displayed.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "The operation failed. Please try again later or contact the administrator.";

/// The main error type for pwdvault operations
#[derive(Error, Debug)]
pub enum PwdVaultError {
    /// Empty or malformed plaintext, key, password or application name
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A key already exists for this application
    #[error("Encryption key already exists for application: {0}")]
    KeyConflict(String),

    /// No key exists for this application
    #[error("Encryption key not found for application: {0}")]
    KeyNotFound(String),

    /// Decryption failed (wrong key, wrong iv, tampered or corrupted data)
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Network or authentication failure talking to the secret store
    #[error("Secret store unavailable: {0}")]
    VaultUnavailable(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The credential store and the secret store disagree after a partial failure
    #[error("Inconsistent state for '{app_name}': {detail}")]
    Inconsistent { app_name: String, detail: String },
}

impl PwdVaultError {
    /// Create a "not found" error for credentials
    pub fn credential_not_found(app_name: &str, user_name: &str) -> Self {
        Self::NotFound {
            entity_type: "Credential",
            identifier: format!("{}/{}", app_name, user_name),
        }
    }

    /// Check if this is a "not found" error (row or key)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::KeyNotFound(_))
    }

    /// Check if retrying the same call could succeed
    ///
    /// Only secret store outages qualify; conflicts and missing keys are
    /// terminal for the call that produced them.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::VaultUnavailable(_))
    }

    /// The text shown to the operator
    ///
    /// Input and configuration problems are reported as-is since they
    /// contain only what the operator typed or configured. Partial failures
    /// name the application and point at the audit log. Everything else
    /// collapses to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Export(_)
            | Self::NotFound { .. }
            | Self::Duplicate { .. } => self.to_string(),
            Self::Inconsistent { app_name, .. } => format!(
                "The operation for '{}' only partially completed and was recorded in the audit log. {}",
                app_name, GENERIC_FAILURE_MESSAGE
            ),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for PwdVaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PwdVaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for PwdVaultError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

/// Result type alias for pwdvault operations
pub type PwdVaultResult<T> = Result<T, PwdVaultError>;
