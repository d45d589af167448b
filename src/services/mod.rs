//! Service layer for pwdvault
//!
//! Business logic on top of storage and the secret store: the credential
//! lifecycle and password helpers.

pub mod credential;
pub mod password;

pub use credential::{CredentialService, CredentialUpdate};
pub use password::{generate_password, is_password_strong};
