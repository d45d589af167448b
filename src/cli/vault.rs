//! Vault login for vault-backed commands

use std::sync::Arc;

use tracing::debug;

use crate::config::settings::{VaultSettings, SECRET_ID_ENV};
use crate::crypto::SecureString;
use crate::error::{PwdVaultError, PwdVaultResult};
use crate::keyvault::{AppRoleCredentials, VaultClientCell, VaultController};

use super::prompt::read_secret;

/// Log in with AppRole and return the shared controller
///
/// The role id comes from settings (or `PWDVAULT_ROLE_ID`); the secret id
/// from `PWDVAULT_SECRET_ID`, else an interactive prompt.
pub async fn connect(
    cell: &VaultClientCell,
    settings: &VaultSettings,
) -> PwdVaultResult<Arc<VaultController>> {
    if let Some(controller) = cell.get() {
        return Ok(controller);
    }

    let from_env = std::env::var(SECRET_ID_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .map(SecureString::from);
    let credentials = app_role_credentials(settings, from_env, || {
        read_secret("Vault AppRole secret id: ")
    })
    .await?;
    cell.get_or_create_client(&credentials, settings).await
}

/// Resolve AppRole credentials; `prompt` runs on the blocking pool so a
/// waiting terminal read never stalls a runtime worker
async fn app_role_credentials<P>(
    settings: &VaultSettings,
    from_env: Option<SecureString>,
    prompt: P,
) -> PwdVaultResult<AppRoleCredentials>
where
    P: FnOnce() -> PwdVaultResult<SecureString> + Send + 'static,
{
    let role_id = settings
        .role_id
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| {
            PwdVaultError::Config(
                "Vault role id not set; run 'pwdvault config set-vault --role-id <ID>'".into(),
            )
        })?;

    let secret_id = match from_env {
        Some(secret) => {
            debug!("Using AppRole secret id from environment");
            secret
        }
        None => tokio::task::spawn_blocking(prompt)
            .await
            .map_err(|e| PwdVaultError::Io(format!("Secret id prompt did not finish: {}", e)))??,
    };
    if secret_id.is_empty() {
        return Err(PwdVaultError::Config("Vault secret id cannot be empty".into()));
    }

    Ok(AppRoleCredentials::new(role_id, secret_id))
}
