//! HashiCorp Vault KV version 2 through `vaultrs`
//!
//! Authenticates once with AppRole and keeps the resulting client token on
//! the `VaultClient` for every later call against the KV mount.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;
use vaultrs::api::kv2::requests::SetSecretRequestOptions;
use vaultrs::auth::approle;
use vaultrs::client::{Client, VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use crate::config::settings::VaultSettings;
use crate::crypto::SecureString;
use crate::error::{PwdVaultError, PwdVaultResult};

use super::store::{SecretData, SecretEntry, SecretStore};

/// AppRole login material
#[derive(Debug, Clone)]
pub struct AppRoleCredentials {
    pub role_id: String,
    pub secret_id: SecureString,
}

impl AppRoleCredentials {
    pub fn new(role_id: impl Into<String>, secret_id: impl Into<SecureString>) -> Self {
        Self {
            role_id: role_id.into(),
            secret_id: secret_id.into(),
        }
    }
}

/// Authenticated client for one KV version 2 mount
pub struct HttpSecretStore {
    client: VaultClient,
    address: String,
    mount: String,
}

impl std::fmt::Debug for HttpSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSecretStore")
            .field("address", &self.address)
            .field("mount", &self.mount)
            .finish()
    }
}

impl HttpSecretStore {
    /// Log in with AppRole and return a store bound to the resulting token
    pub async fn login(
        settings: &VaultSettings,
        credentials: &AppRoleCredentials,
    ) -> PwdVaultResult<Self> {
        let mut client = create_client(settings, "")?;
        debug!(address = %settings.server_uri, "Logging in to Vault with AppRole");

        let auth = approle::login(
            &client,
            &settings.approle_mount,
            &credentials.role_id,
            credentials.secret_id.as_str(),
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "Vault AppRole login rejected");
            PwdVaultError::VaultUnavailable(format!("AppRole login failed: {}", describe(&e)))
        })?;

        client.set_token(&auth.client_token);
        Ok(Self::from_client(client, settings))
    }

    /// Build a store around an existing token
    pub fn with_token(settings: &VaultSettings, token: impl Into<SecureString>) -> PwdVaultResult<Self> {
        let token = token.into();
        let client = create_client(settings, token.as_str())?;
        Ok(Self::from_client(client, settings))
    }

    fn from_client(client: VaultClient, settings: &VaultSettings) -> Self {
        Self {
            client,
            address: settings.server_uri.clone(),
            mount: settings.mount.clone(),
        }
    }
}

/// Create a Vault client; the address is checked first because the
/// settings builder panics on a malformed URL
fn create_client(settings: &VaultSettings, token: &str) -> PwdVaultResult<VaultClient> {
    let address = settings.server_uri.trim_end_matches('/');
    let parsed = Url::parse(address).map_err(|e| {
        PwdVaultError::Config(format!("Invalid Vault address '{}': {}", settings.server_uri, e))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PwdVaultError::Config(format!(
            "Vault address must use http or https: '{}'",
            settings.server_uri
        )));
    }

    let mut builder = VaultClientSettingsBuilder::default();
    builder.address(address);
    builder.token(token);
    builder.timeout(Some(Duration::from_secs(settings.timeout_secs)));

    let client_settings = builder
        .build()
        .map_err(|e| PwdVaultError::Config(format!("Invalid Vault client settings: {}", e)))?;
    VaultClient::new(client_settings)
        .map_err(|e| PwdVaultError::Config(format!("Failed to build Vault client: {}", e)))
}

fn describe(err: &ClientError) -> String {
    match err {
        ClientError::APIError { code, errors } => format!("{} {}", code, errors.join("; ")),
        other => other.to_string(),
    }
}

/// Map a `vaultrs` failure for `path` onto the key error taxonomy
fn classify(err: ClientError, path: &str) -> PwdVaultError {
    match err {
        ClientError::APIError { code: 404, .. } => PwdVaultError::KeyNotFound(path.to_string()),
        ClientError::APIError { code: 400, ref errors }
            if errors.iter().any(|e| e.contains("check-and-set")) =>
        {
            PwdVaultError::KeyConflict(path.to_string())
        }
        ClientError::APIError { code: 401 | 403, .. } => {
            PwdVaultError::VaultUnavailable(format!("Permission denied ({})", describe(&err)))
        }
        ClientError::APIError { code, .. } if code == 429 || code >= 500 => {
            PwdVaultError::VaultUnavailable(format!("Vault returned {}", describe(&err)))
        }
        ClientError::APIError { code, errors } => PwdVaultError::Storage(format!(
            "Vault rejected request ({}): {}",
            code,
            errors.join("; ")
        )),
        other => PwdVaultError::VaultUnavailable(other.to_string()),
    }
}

#[async_trait]
impl SecretStore for HttpSecretStore {
    async fn write_cas(&self, path: &str, data: &SecretData, cas: u64) -> PwdVaultResult<u64> {
        let cas = u32::try_from(cas)
            .map_err(|_| PwdVaultError::InvalidArgument(format!("CAS version out of range: {}", cas)))?;

        let written = kv2::set_with_options(
            &self.client,
            &self.mount,
            path,
            data,
            SetSecretRequestOptions { cas },
        )
        .await
        .map_err(|e| classify(e, path))?;
        Ok(written.version)
    }

    async fn read(&self, path: &str) -> PwdVaultResult<SecretEntry> {
        let metadata = kv2::read_metadata(&self.client, &self.mount, path)
            .await
            .map_err(|e| classify(e, path))?;
        let version = metadata.current_version;
        if version == 0 {
            return Err(PwdVaultError::KeyNotFound(path.to_string()));
        }

        // A soft-deleted or destroyed latest version answers 404
        let data: SecretData = kv2::read_version(&self.client, &self.mount, path, version)
            .await
            .map_err(|e| classify(e, path))?;

        Ok(SecretEntry { data, version })
    }

    async fn patch(&self, path: &str, data: &SecretData) -> PwdVaultResult<u64> {
        let written = kv2::patch(&self.client, &self.mount, path, data)
            .await
            .map_err(|e| classify(e, path))?;
        Ok(written.version)
    }

    async fn destroy(&self, path: &str) -> PwdVaultResult<()> {
        match kv2::delete_metadata(&self.client, &self.mount, path).await {
            Ok(()) => Ok(()),
            Err(e) => match classify(e, path) {
                PwdVaultError::KeyNotFound(_) => Ok(()),
                other => Err(other),
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> VaultSettings {
        VaultSettings {
            server_uri: server.uri(),
            ..VaultSettings::default()
        }
    }

    fn key_data(value: &str) -> SecretData {
        let mut data = SecretData::new();
        data.insert("encryption_key".into(), json!(value));
        data
    }

    #[tokio::test]
    async fn test_login_token_is_used_for_later_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .and(body_partial_json(json!({"role_id": "role", "secret_id": "s3cret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::login("hvs.token")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/secret/metadata/pwdvault/github"))
            .and(header("X-Vault-Token", "hvs.token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpSecretStore::login(
            &settings(&server),
            &AppRoleCredentials::new("role", "s3cret"),
        )
        .await
        .unwrap();
        store.destroy("pwdvault/github").await.unwrap();
    }

    #[tokio::test]
    async fn test_login_rejected_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/approle/login"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(fixtures::errors(&["invalid role or secret ID"])),
            )
            .mount(&server)
            .await;

        let result = HttpSecretStore::login(
            &settings(&server),
            &AppRoleCredentials::new("role", "wrong"),
        )
        .await;
        assert!(matches!(result, Err(PwdVaultError::VaultUnavailable(_))));
    }

    #[tokio::test]
    async fn test_write_cas_sends_options_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/secret/data/pwdvault/github"))
            .and(header("X-Vault-Token", "tok"))
            .and(body_partial_json(json!({
                "options": {"cas": 0},
                "data": {"encryption_key": "AAAA"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::version(1)))
            .mount(&server)
            .await;

        let store = HttpSecretStore::with_token(&settings(&server), "tok").unwrap();
        let version = store
            .write_cas("pwdvault/github", &key_data("AAAA"), 0)
            .await
            .unwrap();
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn test_write_cas_mismatch_is_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/secret/data/pwdvault/github"))
            .respond_with(ResponseTemplate::new(400).set_body_json(fixtures::errors(&[
                "check-and-set parameter did not match the current version",
            ])))
            .mount(&server)
            .await;

        let store = HttpSecretStore::with_token(&settings(&server), "tok").unwrap();
        let result = store.write_cas("pwdvault/github", &key_data("AAAA"), 0).await;
        assert!(matches!(result, Err(PwdVaultError::KeyConflict(_))));
    }

    #[tokio::test]
    async fn test_read_fetches_current_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/metadata/pwdvault/github"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::metadata(3)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/data/pwdvault/github"))
            .and(query_param("version", "3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(fixtures::secret(json!({"encryption_key": "AAAA"}), 3)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpSecretStore::with_token(&settings(&server), "tok").unwrap();
        let entry = store.read("pwdvault/github").await.unwrap();
        assert_eq!(entry.version, 3);
        assert_eq!(entry.data["encryption_key"], json!("AAAA"));
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/metadata/pwdvault/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(fixtures::errors(&[])))
            .mount(&server)
            .await;

        let store = HttpSecretStore::with_token(&settings(&server), "tok").unwrap();
        let result = store.read("pwdvault/missing").await;
        assert!(matches!(result, Err(PwdVaultError::KeyNotFound(_))));
    }

    #[tokio::test]
    async fn test_patch_sends_only_changed_field() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/secret/data/pwdvault/gmail"))
            .and(body_partial_json(json!({"data": {"encryption_key": "BBBB"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::version(2)))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpSecretStore::with_token(&settings(&server), "tok").unwrap();
        let version = store.patch("pwdvault/gmail", &key_data("BBBB")).await.unwrap();
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn test_destroy_missing_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/secret/metadata/pwdvault/github"))
            .respond_with(ResponseTemplate::new(404).set_body_json(fixtures::errors(&[])))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpSecretStore::with_token(&settings(&server), "tok").unwrap();
        store.destroy("pwdvault/github").await.unwrap();
    }

    #[tokio::test]
    async fn test_sealed_vault_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_json(fixtures::errors(&["Vault is sealed"])))
            .mount(&server)
            .await;

        let store = HttpSecretStore::with_token(&settings(&server), "tok").unwrap();
        let result = store.read("pwdvault/github").await;
        assert!(matches!(result, Err(PwdVaultError::VaultUnavailable(_))));
    }

    #[tokio::test]
    async fn test_forbidden_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(403).set_body_json(fixtures::errors(&["permission denied"])))
            .mount(&server)
            .await;

        let store = HttpSecretStore::with_token(&settings(&server), "tok").unwrap();
        let result = store.patch("pwdvault/github", &key_data("AAAA")).await;
        assert!(matches!(result, Err(PwdVaultError::VaultUnavailable(_))));
    }

    #[test]
    fn test_malformed_address_is_config_error() {
        for server_uri in ["not a url", "ftp://vault.internal:8200"] {
            let settings = VaultSettings {
                server_uri: server_uri.into(),
                ..VaultSettings::default()
            };
            let result = HttpSecretStore::with_token(&settings, "tok");
            assert!(matches!(result, Err(PwdVaultError::Config(_))), "accepted {}", server_uri);
        }
    }

    #[test]
    fn test_debug_hides_token() {
        let settings = VaultSettings::default();
        let store = HttpSecretStore::with_token(&settings, "hvs.very-secret").unwrap();
        assert!(!format!("{:?}", store).contains("very-secret"));
    }

    #[test]
    fn test_classify_other_api_errors_as_storage() {
        let err = classify(
            ClientError::APIError {
                code: 400,
                errors: vec!["no data provided".into()],
            },
            "pwdvault/github",
        );
        assert!(matches!(err, PwdVaultError::Storage(ref msg) if msg.contains("no data provided")));
    }
}
