//! CLI command for CSV export
//!
//! A metadata export works offline. Adding passwords needs the secret store
//! and prints a warning, since the file then holds plaintext.

use std::io::BufWriter;
use std::path::Path;

use crate::error::{PwdVaultError, PwdVaultResult};
use crate::export::{export_credentials_csv, export_credentials_with_passwords_csv};
use crate::keyvault::{KeyVaultController, SecretStore};
use crate::services::CredentialService;
use crate::storage::file_io::create_private;
use crate::storage::Storage;

fn create_output(output: &Path) -> PwdVaultResult<BufWriter<std::fs::File>> {
    let file = create_private(output).map_err(|e| {
        PwdVaultError::Export(format!(
            "Failed to create file {}: {}",
            output.display(),
            e
        ))
    })?;
    Ok(BufWriter::new(file))
}

/// Write credential metadata to `output`
pub fn handle_export(storage: &Storage, output: &Path) -> PwdVaultResult<()> {
    let count = export_credentials_csv(storage, create_output(output)?)?;
    println!("Exported {} credentials to: {}", count, output.display());
    Ok(())
}

/// Write credential metadata and decrypted passwords to `output`
pub async fn handle_export_with_passwords<S: SecretStore>(
    storage: &Storage,
    vault: &KeyVaultController<S>,
    output: &Path,
) -> PwdVaultResult<()> {
    let service = CredentialService::new(storage, vault);
    let count = export_credentials_with_passwords_csv(&service, create_output(output)?).await?;
    println!("Exported {} credentials to: {}", count, output.display());
    eprintln!("Warning: this file contains plaintext passwords. Delete it once it is no longer needed.");
    Ok(())
}
