//! AES-GCM encryption/decryption of secret strings
//!
//! Every call generates a fresh random nonce which is returned as the `iv`
//! half of a [`CipherBundle`]. The authentication tag is appended to the
//! ciphertext, so tampering, a wrong key and a wrong iv all surface as
//! [`PwdVaultError::Crypto`].
//!
//! Key length selects the variant: 16 bytes for AES-128, 24 for AES-192 and
//! 32 for AES-256.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use tracing::debug;

use crate::error::{PwdVaultError, PwdVaultResult};

use super::secure_memory::{SecureBytes, SecureString};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// Size of freshly minted data keys (AES-256)
pub const DATA_KEY_SIZE: usize = 32;

/// Key sizes accepted by [`encrypt`] and [`decrypt`]
pub const VALID_KEY_SIZES: [usize; 3] = [16, 24, 32];

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Output of one [`encrypt`] call
///
/// Only meaningful together with the key it was produced under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBundle {
    /// Ciphertext with the authentication tag appended
    pub ciphertext: Vec<u8>,
    /// Nonce used for this encryption; not secret, stored next to the ciphertext
    pub iv: Vec<u8>,
}

/// Generate a random 256-bit data key
pub fn generate_data_key() -> SecureBytes {
    SecureBytes::random(DATA_KEY_SIZE)
}

/// Encrypt a UTF-8 secret under `key`
pub fn encrypt(plaintext: &str, key: &[u8]) -> PwdVaultResult<CipherBundle> {
    if plaintext.is_empty() {
        return Err(PwdVaultError::InvalidArgument(
            "The plaintext is empty".into(),
        ));
    }
    validate_key(key)?;

    debug!(key_len = key.len(), "Encrypting secret");

    let mut iv = vec![0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = match key.len() {
        16 => seal::<Aes128Gcm>(key, &iv, plaintext.as_bytes()),
        24 => seal::<Aes192Gcm>(key, &iv, plaintext.as_bytes()),
        _ => seal::<Aes256Gcm>(key, &iv, plaintext.as_bytes()),
    }?;

    Ok(CipherBundle { ciphertext, iv })
}

/// Decrypt a ciphertext produced by [`encrypt`]
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> PwdVaultResult<SecureString> {
    if ciphertext.is_empty() {
        return Err(PwdVaultError::InvalidArgument(
            "The ciphertext is empty".into(),
        ));
    }
    validate_key(key)?;
    if iv.len() != NONCE_SIZE {
        return Err(PwdVaultError::InvalidArgument(format!(
            "Invalid iv size: expected {}, got {}",
            NONCE_SIZE,
            iv.len()
        )));
    }

    debug!(key_len = key.len(), "Decrypting secret");

    let plaintext = match key.len() {
        16 => open::<Aes128Gcm>(key, iv, ciphertext),
        24 => open::<Aes192Gcm>(key, iv, ciphertext),
        _ => open::<Aes256Gcm>(key, iv, ciphertext),
    }?;

    String::from_utf8(plaintext)
        .map(SecureString::new)
        .map_err(|_| PwdVaultError::Crypto("Invalid UTF-8 in decrypted data".into()))
}

fn validate_key(key: &[u8]) -> PwdVaultResult<()> {
    if key.is_empty() {
        return Err(PwdVaultError::InvalidArgument(
            "The encryption key is empty".into(),
        ));
    }
    if !VALID_KEY_SIZES.contains(&key.len()) {
        return Err(PwdVaultError::InvalidArgument(format!(
            "Invalid key size: {} bytes (expected 16, 24 or 32)",
            key.len()
        )));
    }
    Ok(())
}

fn seal<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> PwdVaultResult<Vec<u8>>
where
    C: KeyInit + Aead,
{
    let cipher = C::new_from_slice(key)
        .map_err(|e| PwdVaultError::InvalidArgument(format!("Failed to create cipher: {}", e)))?;

    cipher
        .encrypt(aes_gcm::aead::Nonce::<C>::from_slice(iv), plaintext)
        .map_err(|e| PwdVaultError::Crypto(format!("Encryption failed: {}", e)))
}

fn open<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> PwdVaultResult<Vec<u8>>
where
    C: KeyInit + Aead,
{
    let cipher = C::new_from_slice(key)
        .map_err(|e| PwdVaultError::InvalidArgument(format!("Failed to create cipher: {}", e)))?;

    cipher
        .decrypt(aes_gcm::aead::Nonce::<C>::from_slice(iv), ciphertext)
        .map_err(|_| {
            PwdVaultError::Crypto("Decryption failed: invalid key, iv or corrupted data".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn random_key(len: usize) -> Vec<u8> {
        let mut key = vec![0u8; len];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn test_encrypt_decrypt_scenario() {
        let key = random_key(32);
        let bundle = encrypt("Secr3t!Pass", &key).unwrap();
        let decrypted = decrypt(&bundle.ciphertext, &key, &bundle.iv).unwrap();
        assert_eq!(decrypted.as_str(), "Secr3t!Pass");
    }

    #[test]
    fn test_round_trip_all_key_sizes() {
        let samples = [
            "a".to_string(),
            "pässwörd-日本語-🔑".to_string(),
            "x".repeat(10_000),
            "é".repeat(10_000),
        ];
        for len in VALID_KEY_SIZES {
            let key = random_key(len);
            for plaintext in &samples {
                let bundle = encrypt(plaintext, &key).unwrap();
                assert_eq!(bundle.ciphertext.len(), plaintext.len() + TAG_SIZE);
                let decrypted = decrypt(&bundle.ciphertext, &key, &bundle.iv).unwrap();
                assert_eq!(decrypted.as_str(), plaintext.as_str());
            }
        }
    }

    #[test]
    fn test_iv_unique_across_calls() {
        let key = random_key(32);
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let bundle = encrypt("same plaintext", &key).unwrap();
            assert_eq!(bundle.iv.len(), NONCE_SIZE);
            assert!(seen.insert(bundle.iv), "iv reused");
        }
    }

    #[test]
    fn test_same_plaintext_different_ciphertext() {
        let key = random_key(32);
        let first = encrypt("Hello, World!", &key).unwrap();
        let second = encrypt("Hello, World!", &key).unwrap();
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let bundle = encrypt("Hello, World!", &random_key(32)).unwrap();
        let result = decrypt(&bundle.ciphertext, &random_key(32), &bundle.iv);
        assert!(matches!(result, Err(PwdVaultError::Crypto(_))));
    }

    #[test]
    fn test_wrong_iv_fails() {
        let key = random_key(32);
        let bundle = encrypt("Hello, World!", &key).unwrap();
        let other = encrypt("Hello, World!", &key).unwrap();
        let result = decrypt(&bundle.ciphertext, &key, &other.iv);
        assert!(matches!(result, Err(PwdVaultError::Crypto(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = random_key(16);
        let mut bundle = encrypt("Hello, World!", &key).unwrap();
        bundle.ciphertext[0] ^= 0xFF;
        let result = decrypt(&bundle.ciphertext, &key, &bundle.iv);
        assert!(matches!(result, Err(PwdVaultError::Crypto(_))));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let key = random_key(32);
        assert!(matches!(
            encrypt("", &key),
            Err(PwdVaultError::InvalidArgument(_))
        ));
        assert!(matches!(
            encrypt("secret", &[]),
            Err(PwdVaultError::InvalidArgument(_))
        ));
        assert!(matches!(
            decrypt(&[], &key, &[0u8; NONCE_SIZE]),
            Err(PwdVaultError::InvalidArgument(_))
        ));
        assert!(matches!(
            decrypt(&[1, 2, 3], &[], &[0u8; NONCE_SIZE]),
            Err(PwdVaultError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_key_size_rejected() {
        let result = encrypt("secret", &random_key(20));
        assert!(matches!(result, Err(PwdVaultError::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_iv_size_rejected() {
        let key = random_key(32);
        let bundle = encrypt("secret", &key).unwrap();
        let result = decrypt(&bundle.ciphertext, &key, &[0u8; 16]);
        assert!(matches!(result, Err(PwdVaultError::InvalidArgument(_))));
    }

    #[test]
    fn test_generated_data_keys_are_distinct() {
        let a = generate_data_key();
        let b = generate_data_key();
        assert_eq!(a.len(), DATA_KEY_SIZE);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }
}
