//! Path management for pwdvault
//!
//! ## Path Resolution Order
//!
//! 1. `PWDVAULT_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/pwdvault` or `~/.config/pwdvault`
//! 3. Windows: `%APPDATA%\pwdvault`

use std::path::{Path, PathBuf};

use crate::error::PwdVaultError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "PWDVAULT_DATA_DIR";

/// Manages all paths used by pwdvault
#[derive(Debug, Clone)]
pub struct PwdVaultPaths {
    base_dir: PathBuf,
}

impl PwdVaultPaths {
    /// Resolve the base directory from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no home or application data directory can be found.
    pub fn new() -> Result<Self, PwdVaultError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Directory holding the credential rows
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to credentials.json
    pub fn credentials_file(&self) -> PathBuf {
        self.data_dir().join("credentials.json")
    }

    /// Create the base and data directories, readable by the owner only
    pub fn ensure_directories(&self) -> Result<(), PwdVaultError> {
        for dir in [self.base_dir.clone(), self.data_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                PwdVaultError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
            restrict_to_owner(&dir)?;
        }
        Ok(())
    }

    /// Check if pwdvault has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(unix)]
fn restrict_to_owner(dir: &Path) -> Result<(), PwdVaultError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).map_err(|e| {
        PwdVaultError::Io(format!("Failed to restrict {}: {}", dir.display(), e))
    })
}

#[cfg(not(unix))]
fn restrict_to_owner(_dir: &Path) -> Result<(), PwdVaultError> {
    Ok(())
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, PwdVaultError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME").map_err(|_| {
                PwdVaultError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("pwdvault"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, PwdVaultError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| PwdVaultError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("pwdvault"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PwdVaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.audit_log(), temp_dir.path().join("audit.log"));
    }

    #[test]
    fn test_env_var_override() {
        let temp_dir = TempDir::new().unwrap();
        env::set_var(DATA_DIR_ENV, temp_dir.path());

        let paths = PwdVaultPaths::new().unwrap();
        assert_eq!(paths.base_dir(), temp_dir.path());

        env::remove_var(DATA_DIR_ENV);
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PwdVaultPaths::with_base_dir(temp_dir.path().join("nested"));

        assert!(!paths.is_initialized());
        paths.ensure_directories().unwrap();
        assert!(paths.data_dir().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_directories_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let paths = PwdVaultPaths::with_base_dir(temp_dir.path().join("vault"));
        paths.ensure_directories().unwrap();

        let mode = std::fs::metadata(paths.data_dir()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PwdVaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.credentials_file(),
            temp_dir.path().join("data").join("credentials.json")
        );
    }
}
