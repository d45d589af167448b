//! Key derivation using Argon2id
//!
//! Derives key material from human passwords using Argon2id, a memory-hard
//! key derivation function resistant to GPU/ASIC attacks.
//!
//! A fresh salt is generated on every [`derive_key`] call and returned inside
//! [`DerivedKeyMaterial`]. Callers that need to reproduce the key later must
//! persist that salt together with the parameters.

use std::time::{Duration, Instant};

use argon2::{Algorithm, Argon2, Params, Version};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PwdVaultError, PwdVaultResult};

use super::secure_memory::SecureBytes;

/// Size of the random salt in bytes (128 bits)
pub const SALT_SIZE: usize = 16;

/// Size of the derived key in bytes (128 bits)
pub const DERIVED_KEY_SIZE: usize = 16;

/// Shortest salt Argon2 accepts
const MIN_SALT_LEN: usize = 8;

/// Lower bound of the acceptable derivation time on deployment hardware
pub const MIN_DERIVATION_TIME: Duration = Duration::from_millis(500);

/// Upper bound of the acceptable derivation time on deployment hardware
pub const MAX_DERIVATION_TIME: Duration = Duration::from_secs(5);

/// Parameters for key derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyDerivationParams {
    /// Memory cost in KiB (default: 512000)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 4)
    pub time_cost: u32,
    /// Parallelism degree (default: twice the available processors)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 512_000,
            time_cost: 4,
            parallelism: default_parallelism(),
        }
    }
}

impl KeyDerivationParams {
    /// Create params with specific values
    pub fn with_values(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    fn to_argon2(&self) -> PwdVaultResult<Argon2<'static>> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(DERIVED_KEY_SIZE),
        )
        .map_err(|e| PwdVaultError::InvalidArgument(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Twice the number of processors available to this process
pub fn default_parallelism() -> u32 {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    u32::try_from(cpus * 2).unwrap_or(u32::MAX)
}

/// Output of a derivation: the key plus everything needed to reproduce it
#[derive(Debug, Clone)]
pub struct DerivedKeyMaterial {
    key: SecureBytes,
    salt: Vec<u8>,
    params: KeyDerivationParams,
}

impl DerivedKeyMaterial {
    /// Get the key bytes
    pub fn key(&self) -> &[u8] {
        self.key.as_bytes()
    }

    /// Get the salt used for this derivation
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Get the salt as base64, suitable for persisting
    pub fn salt_b64(&self) -> String {
        STANDARD.encode(&self.salt)
    }

    /// Get the parameters used for this derivation
    pub fn params(&self) -> &KeyDerivationParams {
        &self.params
    }
}

/// Generate a random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive key material from a password with the default parameters and a fresh salt
pub fn derive_key(password: &str) -> PwdVaultResult<DerivedKeyMaterial> {
    derive_key_with_params(password, &KeyDerivationParams::default())
}

/// Derive key material from a password with a fresh salt
pub fn derive_key_with_params(
    password: &str,
    params: &KeyDerivationParams,
) -> PwdVaultResult<DerivedKeyMaterial> {
    derive_key_with_salt(password, &generate_salt(), params)
}

/// Reproduce key material from a password and a previously stored salt
pub fn derive_key_with_salt(
    password: &str,
    salt: &[u8],
    params: &KeyDerivationParams,
) -> PwdVaultResult<DerivedKeyMaterial> {
    if password.is_empty() {
        return Err(PwdVaultError::InvalidArgument("The password is empty".into()));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(PwdVaultError::InvalidArgument(format!(
            "Salt too short: {} bytes",
            salt.len()
        )));
    }

    debug!(
        memory_cost = params.memory_cost,
        time_cost = params.time_cost,
        parallelism = params.parallelism,
        "Deriving key"
    );

    let argon2 = params.to_argon2()?;
    let mut key = vec![0u8; DERIVED_KEY_SIZE];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| PwdVaultError::Crypto(format!("Key derivation failed: {}", e)))?;

    Ok(DerivedKeyMaterial {
        key: SecureBytes::new(key),
        salt: salt.to_vec(),
        params: params.clone(),
    })
}

/// Time a single derivation with the given parameters
///
/// Used to calibrate parameters against [`MIN_DERIVATION_TIME`] and
/// [`MAX_DERIVATION_TIME`] on the deployment machine.
pub fn benchmark(params: &KeyDerivationParams) -> PwdVaultResult<Duration> {
    let start = Instant::now();
    derive_key_with_params("calibration-password", params)?;
    Ok(start.elapsed())
}

/// Check whether a measured derivation time falls inside the target window
pub fn within_target(elapsed: Duration) -> bool {
    (MIN_DERIVATION_TIME..=MAX_DERIVATION_TIME).contains(&elapsed)
}
