//! Core data models for pwdvault

pub mod credential;
pub mod ids;

pub use credential::{icon_name_for, Credential, CredentialValidationError, DEFAULT_CATEGORY, GENERIC_ICON};
pub use ids::CredentialId;
