//! Credential CLI commands
//!
//! Add, show, edit and delete need the secret store; list works offline
//! since it never decrypts.

use clap::Subcommand;

use crate::crypto::SecureString;
use crate::display::{format_credential_details, format_credential_list};
use crate::error::PwdVaultResult;
use crate::keyvault::{KeyVaultController, SecretStore};
use crate::services::{generate_password, is_password_strong, CredentialService, CredentialUpdate};
use crate::storage::Storage;

use super::prompt::{confirm, read_new_password};

/// Credential subcommands backed by the secret store
#[derive(Subcommand)]
pub enum CredentialCommands {
    /// Store a new password for an application
    Add {
        /// Application name
        app: String,
        /// User name for the application
        user: String,
        /// Category label
        #[arg(short, long)]
        category: Option<String>,
        /// Generate a strong random password instead of prompting
        #[arg(short, long)]
        generate: bool,
    },
    /// Print the stored password
    Show {
        /// Application name
        app: String,
        /// User name for the application
        user: String,
        /// Print metadata above the password
        #[arg(short, long)]
        details: bool,
    },
    /// Change the password and/or category
    Edit {
        /// Application name
        app: String,
        /// User name for the application
        user: String,
        /// New category label
        #[arg(short, long)]
        category: Option<String>,
        /// Prompt for a new password
        #[arg(short, long, conflicts_with = "generate")]
        password: bool,
        /// Replace the password with a generated one
        #[arg(short, long)]
        generate: bool,
    },
    /// Delete a credential and destroy its key
    Delete {
        /// Application name
        app: String,
        /// User name for the application
        user: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Handle a credential command
pub async fn handle_credential_command<S: SecretStore>(
    storage: &Storage,
    vault: &KeyVaultController<S>,
    cmd: CredentialCommands,
) -> PwdVaultResult<()> {
    let service = CredentialService::new(storage, vault);

    match cmd {
        CredentialCommands::Add {
            app,
            user,
            category,
            generate,
        } => {
            let secret = new_secret(generate)?;
            let credential = service
                .create(category.as_deref(), &app, &user, secret.as_str())
                .await?;
            println!("Stored password for {}", credential);
        }

        CredentialCommands::Show { app, user, details } => {
            if details {
                if let Some(credential) = storage.credentials.get(&app, &user)? {
                    println!("{}", format_credential_details(&credential));
                    println!();
                }
            }
            let secret = service.reveal(&app, &user).await?;
            println!("{}", secret.as_str());
        }

        CredentialCommands::Edit {
            app,
            user,
            category,
            password,
            generate,
        } => {
            let secret = if password || generate {
                Some(new_secret(generate)?)
            } else {
                None
            };
            let update = CredentialUpdate {
                secret: secret.as_ref().map(|s| s.as_str()),
                category: category.as_deref(),
            };
            let credential = service.edit(&app, &user, update).await?;
            println!("Updated {}", credential);
        }

        CredentialCommands::Delete { app, user, yes } => {
            if !yes && !confirm(&format!("Delete the password for {} ({})?", app, user))? {
                println!("Cancelled.");
                return Ok(());
            }
            let credential = service.delete(&app, &user).await?;
            println!("Deleted {}", credential);
        }
    }

    Ok(())
}

/// Print all credentials
pub fn handle_list(storage: &Storage) -> PwdVaultResult<()> {
    println!("{}", format_credential_list(&storage.credentials.get_all()?));
    Ok(())
}

/// Print a generated password
pub fn handle_generate() {
    println!("{}", generate_password().as_str());
}

fn new_secret(generate: bool) -> PwdVaultResult<SecureString> {
    if generate {
        return Ok(generate_password());
    }

    let secret = read_new_password()?;
    if !is_password_strong(secret.as_str()) {
        eprintln!(
            "Warning: weak password. Use at least 12 characters mixing upper and lower case letters, digits and symbols."
        );
    }
    Ok(secret)
}
