//! Configuration CLI commands

use clap::Subcommand;

use crate::config::paths::PwdVaultPaths;
use crate::config::settings::Settings;
use crate::error::{PwdVaultError, PwdVaultResult};

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show paths and settings
    Show,
    /// Update the Vault connection settings
    SetVault {
        /// Server address, e.g. https://vault.example.com:8200
        #[arg(long)]
        address: Option<String>,
        /// AppRole role id
        #[arg(long)]
        role_id: Option<String>,
        /// KV version 2 mount
        #[arg(long)]
        mount: Option<String>,
        /// Prefix for application key paths
        #[arg(long)]
        base_path: Option<String>,
        /// AppRole auth mount
        #[arg(long)]
        approle_mount: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// Handle a config command
///
/// `settings` is the file content; environment overrides are shown but
/// never saved.
pub fn handle_config_command(
    paths: &PwdVaultPaths,
    settings: &mut Settings,
    cmd: ConfigCommands,
) -> PwdVaultResult<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("{}", format_config(paths, &settings.with_env_overrides()));
        }

        ConfigCommands::SetVault {
            address,
            role_id,
            mount,
            base_path,
            approle_mount,
            timeout,
        } => {
            let vault = &mut settings.vault;
            if let Some(address) = address {
                vault.server_uri = required(address, "Address")?;
            }
            if let Some(role_id) = role_id {
                vault.role_id = Some(required(role_id, "Role id")?);
            }
            if let Some(mount) = mount {
                vault.mount = required(mount, "Mount")?;
            }
            if let Some(base_path) = base_path {
                vault.base_path = base_path;
            }
            if let Some(approle_mount) = approle_mount {
                vault.approle_mount = required(approle_mount, "AppRole mount")?;
            }
            if let Some(timeout) = timeout {
                if timeout == 0 {
                    return Err(PwdVaultError::InvalidArgument(
                        "Timeout must be at least one second".into(),
                    ));
                }
                vault.timeout_secs = timeout;
            }

            settings.save(paths)?;
            println!("Vault settings saved to {}", paths.settings_file().display());
        }
    }

    Ok(())
}

fn required(value: String, what: &str) -> PwdVaultResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PwdVaultError::InvalidArgument(format!(
            "{} cannot be empty",
            what
        )));
    }
    Ok(trimmed.to_string())
}

fn format_config(paths: &PwdVaultPaths, settings: &Settings) -> String {
    let vault = &settings.vault;
    let lines = [
        "pwdvault Configuration".to_string(),
        "======================".to_string(),
        format!("Config directory: {}", paths.base_dir().display()),
        format!("Credentials:      {}", paths.credentials_file().display()),
        format!("Audit log:        {}", paths.audit_log().display()),
        String::new(),
        "Vault:".to_string(),
        format!("  Address:       {}", vault.server_uri),
        format!(
            "  Role id:       {}",
            vault.role_id.as_deref().unwrap_or("(not set)")
        ),
        format!("  Mount:         {}", vault.mount),
        format!("  Base path:     {}", vault.base_path),
        format!("  AppRole mount: {}", vault.approle_mount),
        format!("  Timeout:       {}s", vault.timeout_secs),
        format!(
            "  Retry:         {} attempts, {}ms base delay, {}ms max delay",
            vault.retry.max_attempts, vault.retry.base_delay_ms, vault.retry.max_delay_ms
        ),
        String::new(),
        "Key derivation (Argon2id):".to_string(),
        format!("  Memory:        {} KiB", settings.kdf.memory_cost),
        format!("  Iterations:    {}", settings.kdf.time_cost),
        format!("  Parallelism:   {}", settings.kdf.parallelism),
    ];
    lines.join("\n")
}
