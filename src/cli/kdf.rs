//! Key derivation calibration commands

use clap::Subcommand;

use crate::config::paths::PwdVaultPaths;
use crate::config::settings::Settings;
use crate::crypto::key_derivation::{
    benchmark, within_target, KeyDerivationParams, MAX_DERIVATION_TIME, MIN_DERIVATION_TIME,
};
use crate::error::{PwdVaultError, PwdVaultResult};

/// KDF subcommands
#[derive(Subcommand)]
pub enum KdfCommands {
    /// Time one Argon2id derivation on this machine
    Bench {
        /// Memory cost in KiB (default: configured value)
        #[arg(short, long)]
        memory: Option<u32>,
        /// Iterations (default: configured value)
        #[arg(short, long)]
        time: Option<u32>,
        /// Lanes (default: configured value)
        #[arg(short, long)]
        parallelism: Option<u32>,
        /// Save the parameters if they fall within the target window
        #[arg(long)]
        save: bool,
    },
}

/// Handle a kdf command
pub fn handle_kdf_command(
    paths: &PwdVaultPaths,
    settings: &mut Settings,
    cmd: KdfCommands,
) -> PwdVaultResult<()> {
    match cmd {
        KdfCommands::Bench {
            memory,
            time,
            parallelism,
            save,
        } => {
            let params = KeyDerivationParams::with_values(
                memory.unwrap_or(settings.kdf.memory_cost),
                time.unwrap_or(settings.kdf.time_cost),
                parallelism.unwrap_or(settings.kdf.parallelism),
            );

            println!(
                "Deriving with memory={} KiB, iterations={}, parallelism={}...",
                params.memory_cost, params.time_cost, params.parallelism
            );
            let elapsed = benchmark(&params)?;
            let ok = within_target(elapsed);
            println!(
                "Took {:.2}s (target {:.1}s to {:.1}s): {}",
                elapsed.as_secs_f64(),
                MIN_DERIVATION_TIME.as_secs_f64(),
                MAX_DERIVATION_TIME.as_secs_f64(),
                if ok { "within target" } else { "outside target" }
            );

            if save {
                if !ok {
                    return Err(PwdVaultError::InvalidArgument(
                        "Parameters are outside the target window; not saved".into(),
                    ));
                }
                settings.kdf = params;
                settings.save(paths)?;
                println!("Saved to {}", paths.settings_file().display());
            }
        }
    }

    Ok(())
}
