//! Credential row model
//!
//! A credential is one username/password pair for an application. Only the
//! ciphertext and nonce of the password are stored; the key lives in the
//! secret store under the application name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::CredentialId;
use crate::crypto::CipherBundle;

/// Category assigned when none is given
pub const DEFAULT_CATEGORY: &str = "General";

/// A stored credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Unique identifier
    pub id: CredentialId,

    /// Free-form grouping label (e.g. "Social", "Banking")
    pub app_category: String,

    /// Application name; also names the encryption key in the secret store
    pub app_name: String,

    pub user_name: String,

    /// AES-GCM ciphertext with the tag appended
    #[serde(with = "base64_bytes")]
    pub cipher_text: Vec<u8>,

    /// GCM nonce used for `cipher_text`
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,

    /// Icon identifier derived from the application name
    pub icon_name: String,

    pub creation_time: DateTime<Utc>,

    pub update_time: DateTime<Utc>,
}

impl Credential {
    /// Create a new credential row from an encrypted password
    pub fn new(
        app_category: impl Into<String>,
        app_name: impl Into<String>,
        user_name: impl Into<String>,
        sealed: CipherBundle,
    ) -> Self {
        let now = Utc::now();
        let app_name = app_name.into();
        Self {
            id: CredentialId::new(),
            app_category: app_category.into(),
            icon_name: icon_name_for(&app_name),
            app_name,
            user_name: user_name.into(),
            cipher_text: sealed.ciphertext,
            iv: sealed.iv,
            creation_time: now,
            update_time: now,
        }
    }

    /// Replace the encrypted password
    pub fn set_secret(&mut self, sealed: CipherBundle) {
        self.cipher_text = sealed.ciphertext;
        self.iv = sealed.iv;
        self.update_time = Utc::now();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.app_category = category.into();
        self.update_time = Utc::now();
    }

    /// Check whether this row belongs to `app_name`/`user_name`
    pub fn matches(&self, app_name: &str, user_name: &str) -> bool {
        self.app_name == app_name && self.user_name == user_name
    }

    /// Validate the row
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        if self.app_name.trim().is_empty() {
            return Err(CredentialValidationError::EmptyAppName);
        }
        if self.user_name.trim().is_empty() {
            return Err(CredentialValidationError::EmptyUserName);
        }
        if self.app_category.trim().is_empty() {
            return Err(CredentialValidationError::EmptyCategory);
        }
        if self.cipher_text.is_empty() || self.iv.is_empty() {
            return Err(CredentialValidationError::MissingCipherText);
        }
        Ok(())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.app_name, self.user_name)
    }
}

/// Applications with a dedicated icon
const KNOWN_ICONS: &[&str] = &[
    "amazon", "apple", "discord", "dropbox", "facebook", "github", "gitlab", "gmail", "google",
    "instagram", "linkedin", "microsoft", "netflix", "outlook", "paypal", "reddit", "slack",
    "spotify", "steam", "twitter", "youtube",
];

/// Icon used when the application has no dedicated one
pub const GENERIC_ICON: &str = "icons8_image_48";

/// Icon identifier for an application
pub fn icon_name_for(app_name: &str) -> String {
    let normalized = app_name.trim().to_lowercase();
    if KNOWN_ICONS.contains(&normalized.as_str()) {
        format!("icons8_{}_48", normalized)
    } else {
        GENERIC_ICON.to_string()
    }
}

/// Validation errors for credential rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    EmptyAppName,
    EmptyUserName,
    EmptyCategory,
    MissingCipherText,
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAppName => write!(f, "Application name cannot be empty"),
            Self::EmptyUserName => write!(f, "User name cannot be empty"),
            Self::EmptyCategory => write!(f, "Category cannot be empty"),
            Self::MissingCipherText => write!(f, "Credential has no encrypted password"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
