//! Credential service
//!
//! Envelope encryption for stored passwords. Each application gets a random
//! 256-bit data key held in the secret store; the credential row only keeps
//! the ciphertext and nonce.
//!
//! Row writes and key writes are independent, so each operation orders its
//! steps to keep partial failures recoverable and records any inconsistency
//! it cannot undo in the audit log.

use tracing::{debug, error, info, warn};

use crate::audit::{AuditEntry, EntityType, Operation};
use crate::crypto::{decrypt, encrypt, generate_data_key, SecureString};
use crate::error::{PwdVaultError, PwdVaultResult};
use crate::keyvault::{validate_app_name, KeyVaultController, SecretStore};
use crate::models::{Credential, DEFAULT_CATEGORY};
use crate::storage::Storage;

/// Changes requested by an edit
#[derive(Debug, Default)]
pub struct CredentialUpdate<'a> {
    pub secret: Option<&'a str>,
    pub category: Option<&'a str>,
}

/// Service for credential lifecycle operations
pub struct CredentialService<'a, S> {
    storage: &'a Storage,
    vault: &'a KeyVaultController<S>,
}

impl<'a, S: SecretStore> CredentialService<'a, S> {
    /// Create a new credential service
    pub fn new(storage: &'a Storage, vault: &'a KeyVaultController<S>) -> Self {
        Self { storage, vault }
    }

    /// Store a new credential under a freshly minted key
    ///
    /// A `KeyConflict` from the secret store aborts before any row is
    /// written. If the row cannot be persisted the key is destroyed again.
    pub async fn create(
        &self,
        category: Option<&str>,
        app_name: &str,
        user_name: &str,
        secret: &str,
    ) -> PwdVaultResult<Credential> {
        validate_app_name(app_name)?;
        let user_name = non_empty(user_name, "User name")?;
        let category = match category {
            Some(c) => non_empty(c, "Category")?,
            None => DEFAULT_CATEGORY,
        };
        if secret.is_empty() {
            return Err(PwdVaultError::InvalidArgument(
                "Password cannot be empty".into(),
            ));
        }

        if let Some(existing) = self.storage.credentials.get_by_app(app_name)? {
            return Err(PwdVaultError::Duplicate {
                entity_type: "Credential",
                identifier: format!("{}/{}", existing.app_name, existing.user_name),
            });
        }

        let key = generate_data_key();
        let sealed = encrypt(secret, &key)?;

        self.vault.create_key(app_name, &key).await?;
        drop(key);

        let credential = Credential::new(category, app_name, user_name, sealed);
        if let Err(e) = self.storage.credentials.insert(credential.clone()) {
            warn!(app = app_name, error = %e, "Credential row not saved, destroying new key");
            return Err(self.compensate_create(app_name, e).await);
        }

        self.storage.record(
            AuditEntry::new(Operation::Create, EntityType::EncryptionKey, app_name, None),
        );
        self.storage.record(AuditEntry::new(
            Operation::Create,
            EntityType::Credential,
            credential.id.to_string(),
            Some(credential.to_string()),
        ));
        info!(app = app_name, id = %credential.id, "Created credential");
        Ok(credential)
    }

    /// Decrypt the password for `app_name`/`user_name`
    pub async fn reveal(&self, app_name: &str, user_name: &str) -> PwdVaultResult<SecureString> {
        let credential = self.find(app_name, user_name)?;
        let key = self.vault.read_key(app_name).await?;
        let secret = decrypt(&credential.cipher_text, &key, &credential.iv)?;

        debug!(app = app_name, id = %credential.id, "Revealed credential");
        Ok(secret)
    }

    /// Change the password and/or category
    ///
    /// A new password is encrypted under a new key that replaces the old one,
    /// so the previous ciphertext becomes undecryptable. If the row cannot
    /// be saved after the rotation the mismatch is audited and reported as
    /// `Inconsistent`.
    pub async fn edit(
        &self,
        app_name: &str,
        user_name: &str,
        update: CredentialUpdate<'_>,
    ) -> PwdVaultResult<Credential> {
        if update.secret.is_none() && update.category.is_none() {
            return Err(PwdVaultError::InvalidArgument(
                "Nothing to change: give a new password or category".into(),
            ));
        }
        if update.secret == Some("") {
            return Err(PwdVaultError::InvalidArgument(
                "Password cannot be empty".into(),
            ));
        }
        let category = update
            .category
            .map(|c| non_empty(c, "Category"))
            .transpose()?;

        let mut credential = self.find(app_name, user_name)?;
        let mut changes = Vec::new();

        if let Some(category) = category {
            if category != credential.app_category {
                changes.push(format!(
                    "category: {} -> {}",
                    credential.app_category, category
                ));
            }
            credential.set_category(category);
        }

        let rotated = match update.secret {
            Some(secret) => {
                let key = generate_data_key();
                credential.set_secret(encrypt(secret, &key)?);
                self.vault.rotate_key(app_name, &key).await?;
                changes.push("password changed".to_string());
                true
            }
            None => false,
        };

        if let Err(e) = self.storage.credentials.update(credential.clone()) {
            if !rotated {
                return Err(e);
            }
            let detail = format!(
                "key rotated but credential row not updated ({}); stored password can no longer be decrypted",
                e
            );
            error!(app = app_name, error = %e, "Credential left undecryptable after key rotation");
            self.storage
                .record(AuditEntry::inconsistency(app_name, detail.clone()));
            return Err(PwdVaultError::Inconsistent {
                app_name: app_name.to_string(),
                detail,
            });
        }

        if rotated {
            self.storage.record(AuditEntry::new(
                Operation::Update,
                EntityType::EncryptionKey,
                app_name,
                None,
            ));
        }
        let mut entry = AuditEntry::new(
            Operation::Update,
            EntityType::Credential,
            credential.id.to_string(),
            Some(credential.to_string()),
        );
        if !changes.is_empty() {
            entry = entry.with_details(changes.join(", "));
        }
        self.storage.record(entry);

        info!(app = app_name, id = %credential.id, rotated, "Updated credential");
        Ok(credential)
    }

    /// Remove the credential row, then destroy its key
    ///
    /// A key that cannot be destroyed is left orphaned in the secret store;
    /// this is audited and reported as `Inconsistent` without retrying.
    pub async fn delete(&self, app_name: &str, user_name: &str) -> PwdVaultResult<Credential> {
        validate_app_name(app_name)?;
        let credential = self.storage.credentials.remove(app_name, user_name)?;

        self.storage.record(AuditEntry::new(
            Operation::Delete,
            EntityType::Credential,
            credential.id.to_string(),
            Some(credential.to_string()),
        ));

        if let Err(e) = self.vault.delete_key(app_name).await {
            let detail = format!("credential deleted but key not destroyed ({}); orphaned key", e);
            error!(app = app_name, error = %e, "Encryption key orphaned");
            self.storage
                .record(AuditEntry::inconsistency(app_name, detail.clone()));
            return Err(PwdVaultError::Inconsistent {
                app_name: app_name.to_string(),
                detail,
            });
        }

        self.storage.record(AuditEntry::new(
            Operation::Delete,
            EntityType::EncryptionKey,
            app_name,
            None,
        ));
        info!(app = app_name, id = %credential.id, "Deleted credential");
        Ok(credential)
    }

    /// All credentials, without decrypting anything
    pub fn list(&self) -> PwdVaultResult<Vec<Credential>> {
        self.storage.credentials.get_all()
    }

    fn find(&self, app_name: &str, user_name: &str) -> PwdVaultResult<Credential> {
        validate_app_name(app_name)?;
        self.storage
            .credentials
            .get(app_name, user_name)?
            .ok_or_else(|| PwdVaultError::credential_not_found(app_name, user_name))
    }

    /// Undo a key creation whose row was not saved
    async fn compensate_create(&self, app_name: &str, cause: PwdVaultError) -> PwdVaultError {
        match self.vault.delete_key(app_name).await {
            Ok(()) => cause,
            Err(e) => {
                let detail = format!(
                    "credential row not saved ({}) and new key not destroyed ({}); orphaned key",
                    cause, e
                );
                error!(app = app_name, error = %e, "Encryption key orphaned after failed create");
                self.storage
                    .record(AuditEntry::inconsistency(app_name, detail.clone()));
                PwdVaultError::Inconsistent {
                    app_name: app_name.to_string(),
                    detail,
                }
            }
        }
    }
}

fn non_empty<'s>(value: &'s str, what: &str) -> PwdVaultResult<&'s str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PwdVaultError::InvalidArgument(format!(
            "{} cannot be empty",
            what
        )));
    }
    Ok(trimmed)
}
