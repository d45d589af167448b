use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use pwdvault::cli::{
    connect, handle_audit, handle_config_command, handle_credential_command, handle_export,
    handle_export_with_passwords, handle_generate, handle_kdf_command, handle_list,
    ConfigCommands, CredentialCommands, KdfCommands,
};
use pwdvault::config::{paths::PwdVaultPaths, settings::Settings};
use pwdvault::error::{PwdVaultError, GENERIC_FAILURE_MESSAGE};
use pwdvault::keyvault::VaultClientCell;
use pwdvault::storage::Storage;

#[derive(Parser)]
#[command(
    name = "pwdvault",
    author = "Kaylee Beyene",
    version,
    about = "Personal credential vault backed by HashiCorp Vault",
    long_about = "pwdvault stores application passwords encrypted with AES-GCM. \
                  Each application gets its own random data key, held in a \
                  HashiCorp Vault KV version 2 engine; only ciphertext is kept \
                  on disk."
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Credential(CredentialCommands),

    /// List stored credentials (never decrypts)
    #[command(alias = "ls")]
    List,

    /// Print a strong random password
    Generate,

    /// Export credentials to a CSV file
    Export {
        /// Output file path
        output: PathBuf,

        /// Add a Password column with every password decrypted
        #[arg(long)]
        include_passwords: bool,
    },

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Key derivation commands
    #[command(subcommand)]
    Kdf(KdfCommands),

    /// Create the data directory and default settings
    Init,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Command failed");
            let message = match err.downcast_ref::<PwdVaultError>() {
                Some(e) => e.user_message(),
                None => GENERIC_FAILURE_MESSAGE.to_string(),
            };
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "pwdvault=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let paths = PwdVaultPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Credential(cmd)) => {
            let storage = Storage::open(paths.clone())?;
            let effective = settings.with_env_overrides();

            // Login happens before any input is read so an unreachable or
            // misconfigured store fails the command up front.
            let cell = VaultClientCell::new();
            let vault = connect(&cell, &effective.vault).await?;
            handle_credential_command(&storage, vault.as_ref(), cmd).await?;
        }
        Some(Commands::List) => {
            let storage = Storage::open(paths.clone())?;
            handle_list(&storage)?;
        }
        Some(Commands::Generate) => handle_generate(),
        Some(Commands::Export {
            output,
            include_passwords,
        }) => {
            let storage = Storage::open(paths.clone())?;
            if include_passwords {
                let cell = VaultClientCell::new();
                let vault = connect(&cell, &settings.with_env_overrides().vault).await?;
                handle_export_with_passwords(&storage, vault.as_ref(), &output).await?;
            } else {
                handle_export(&storage, &output)?;
            }
        }
        Some(Commands::Audit { limit }) => {
            let storage = Storage::open(paths.clone())?;
            handle_audit(&storage.audit, limit)?;
        }
        Some(Commands::Config(cmd)) => {
            handle_config_command(&paths, &mut settings, cmd)?;
        }
        Some(Commands::Kdf(cmd)) => {
            handle_kdf_command(&paths, &mut settings, cmd)?;
        }
        Some(Commands::Init) => {
            println!("Initializing pwdvault at: {}", paths.base_dir().display());
            let storage = Storage::open(paths.clone())?;
            storage.credentials.save()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Next, point pwdvault at your Vault server:");
            println!("  pwdvault config set-vault --address <URL> --role-id <ROLE_ID>");
            println!();
            println!("The AppRole secret id is read from PWDVAULT_SECRET_ID or prompted for.");
        }
        None => {
            println!("pwdvault - credential vault backed by HashiCorp Vault");
            println!();
            println!("Run 'pwdvault --help' for usage information.");
        }
    }

    Ok(())
}
