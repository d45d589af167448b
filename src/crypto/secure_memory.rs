//! Zeroizing containers for key bytes and plaintext passwords
//!
//! Both types wipe their buffer when dropped and never print their contents
//! through `Debug` or `Display`, so they are safe to pass to `tracing` fields.

use std::fmt;
use std::ops::Deref;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

fn redacted(f: &mut fmt::Formatter<'_>, kind: &str, len: usize) -> fmt::Result {
    write!(f, "{}(<{} bytes redacted>)", kind, len)
}

/// A decrypted password, secret id or token
#[derive(Clone, Default)]
pub struct SecureString(Zeroizing<String>);

impl SecureString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Zeroizing::new(s.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for SecureString {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for SecureString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for SecureString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        redacted(f, "SecureString", self.len())
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        redacted(f, "SecureString", self.len())
    }
}

/// Raw key material: application data keys and derived keys
#[derive(Clone, PartialEq, Eq)]
pub struct SecureBytes(Zeroizing<Vec<u8>>);

impl SecureBytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    /// `len` bytes from the operating system RNG
    pub fn random(len: usize) -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        OsRng.fill_bytes(bytes.as_mut_slice());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl Deref for SecureBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        redacted(f, "SecureBytes", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_compares_with_str() {
        let s = SecureString::from("hunter2!");
        assert!(s == "hunter2!");
        assert_eq!(s.len(), 8);
        assert!(SecureString::default().is_empty());
    }

    #[test]
    fn test_string_never_formats_contents() {
        let s = SecureString::new("Secr3t!Pass");
        for rendered in [format!("{:?}", s), format!("{}", s)] {
            assert!(!rendered.contains("Secr3t"));
            assert!(rendered.contains("11 bytes redacted"));
        }
    }

    #[test]
    fn test_bytes_never_formats_contents() {
        let b = SecureBytes::new(vec![0xAB; 5]);
        let debug = format!("{:?}", b);
        assert_eq!(debug, "SecureBytes(<5 bytes redacted>)");
    }

    #[test]
    fn test_random_bytes() {
        let a = SecureBytes::random(32);
        let b = SecureBytes::random(32);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
