//! CSV export of credential rows
//!
//! The default export carries metadata only and never touches the secret
//! store. Passwords are added as a trailing `Password` column only when
//! asked for, each one decrypted through the credential service.

use std::io::Write;

use crate::crypto::SecureString;
use crate::error::PwdVaultResult;
use crate::keyvault::SecretStore;
use crate::models::Credential;
use crate::services::CredentialService;
use crate::storage::Storage;

/// Columns of a metadata export, in order
pub const CSV_HEADER: [&str; 7] = [
    "Id",
    "AppCategory",
    "AppName",
    "UserName",
    "IconName",
    "CreationTime",
    "UpdateTime",
];

const PASSWORD_COLUMN: &str = "Password";

fn metadata_fields(credential: &Credential) -> Vec<String> {
    vec![
        credential.id.as_uuid().to_string(),
        credential.app_category.clone(),
        credential.app_name.clone(),
        credential.user_name.clone(),
        credential.icon_name.clone(),
        credential.creation_time.to_rfc3339(),
        credential.update_time.to_rfc3339(),
    ]
}

/// Export credential metadata; returns the number of rows written
pub fn export_credentials_csv<W: Write>(storage: &Storage, writer: W) -> PwdVaultResult<usize> {
    let credentials = storage.credentials.get_all()?;

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(CSV_HEADER)?;
    for credential in &credentials {
        out.write_record(metadata_fields(credential))?;
    }
    out.flush()?;

    Ok(credentials.len())
}

/// Export credential metadata plus decrypted passwords
///
/// Every password is revealed before the first row is written, so a
/// missing key or an outage leaves `writer` untouched.
pub async fn export_credentials_with_passwords_csv<W: Write, S: SecretStore>(
    service: &CredentialService<'_, S>,
    writer: W,
) -> PwdVaultResult<usize> {
    let credentials = service.list()?;

    let mut revealed: Vec<(&Credential, SecureString)> = Vec::with_capacity(credentials.len());
    for credential in &credentials {
        let secret = service
            .reveal(&credential.app_name, &credential.user_name)
            .await?;
        revealed.push((credential, secret));
    }

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(CSV_HEADER.iter().copied().chain([PASSWORD_COLUMN]))?;
    for (credential, secret) in &revealed {
        let mut record = csv::StringRecord::from(metadata_fields(credential));
        record.push_field(secret.as_str());
        out.write_record(&record)?;
    }
    out.flush()?;

    Ok(revealed.len())
}
