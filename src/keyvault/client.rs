//! One-time construction of the authenticated vault controller
//!
//! The composition root owns a [`VaultClientCell`] and hands the resulting
//! `Arc<KeyVaultController<_>>` to whatever needs it. The first caller
//! performs the AppRole login; concurrent first callers wait for that one
//! login instead of starting their own, and later callers read the
//! initialized value without contention.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::settings::VaultSettings;
use crate::error::{PwdVaultError, PwdVaultResult};

use super::controller::KeyVaultController;
use super::http::{AppRoleCredentials, HttpSecretStore};

/// Controller type backed by a live Vault server
pub type VaultController = KeyVaultController<HttpSecretStore>;

/// Lazily initialized, process-wide vault connection
#[derive(Debug, Default)]
pub struct VaultClientCell {
    controller: OnceCell<Arc<VaultController>>,
}

impl VaultClientCell {
    /// Create an empty cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared controller, logging in on first use
    ///
    /// A failed login leaves the cell empty and is returned to the caller,
    /// which at startup means the process cannot serve vault-backed commands.
    pub async fn get_or_create_client(
        &self,
        credentials: &AppRoleCredentials,
        settings: &VaultSettings,
    ) -> PwdVaultResult<Arc<VaultController>> {
        self.controller
            .get_or_try_init(|| async {
                let store = HttpSecretStore::login(settings, credentials)
                    .await
                    .inspect_err(|e| error!(error = %e, "Vault authentication failed"))?;
                info!(address = %settings.server_uri, "Connected to Vault");

                let controller = KeyVaultController::new(store, settings.base_path.clone())
                    .with_retry(settings.retry.to_retry_config());
                Ok::<_, PwdVaultError>(Arc::new(controller))
            })
            .await
            .map(Arc::clone)
    }

    /// The controller, if a login already succeeded
    pub fn get(&self) -> Option<Arc<VaultController>> {
        self.controller.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyvault::http::fixtures;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> VaultSettings {
        VaultSettings {
            server_uri: server.uri(),
            ..VaultSettings::default()
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(fixtures::login("hvs.token"))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cell = Arc::new(VaultClientCell::new());
        let settings = settings(&server);
        let credentials = AppRoleCredentials::new("role", "secret");

        let (a, b, c) = tokio::join!(
            cell.get_or_create_client(&credentials, &settings),
            cell.get_or_create_client(&credentials, &settings),
            cell.get_or_create_client(&credentials, &settings),
        );
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));

        let later = cell.get_or_create_client(&credentials, &settings).await.unwrap();
        assert!(Arc::ptr_eq(&a, &later));
        assert!(cell.get().is_some());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_cell_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .respond_with(ResponseTemplate::new(403).set_body_json(fixtures::errors(&["permission denied"])))
            .mount(&server)
            .await;

        let cell = VaultClientCell::new();
        let result = cell
            .get_or_create_client(&AppRoleCredentials::new("role", "bad"), &settings(&server))
            .await;

        assert!(matches!(result, Err(PwdVaultError::VaultUnavailable(_))));
        assert!(cell.get().is_none());
    }
}
