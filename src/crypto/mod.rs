//! Cryptographic functions for pwdvault
//!
//! Provides AES-GCM encryption of secret strings under per-application data
//! keys, and Argon2id key derivation for password-based key material.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{decrypt, encrypt, generate_data_key, CipherBundle};
pub use key_derivation::{
    derive_key, derive_key_with_params, derive_key_with_salt, DerivedKeyMaterial,
    KeyDerivationParams,
};
pub use secure_memory::{SecureBytes, SecureString};
