//! Append-only JSONL audit log
//!
//! One JSON object per line, appended and flushed per entry. A process that
//! dies mid-append can leave a torn final line; readers skip it.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use crate::error::{PwdVaultError, PwdVaultResult};

use super::entry::AuditEntry;

/// Writer and reader for `audit.log`
pub struct AuditLogger {
    log_path: PathBuf,
    append_lock: Mutex<()>,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            append_lock: Mutex::new(()),
        }
    }

    /// Append `entry` as one line
    pub fn log(&self, entry: &AuditEntry) -> PwdVaultResult<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let _guard = self
            .append_lock
            .lock()
            .map_err(|e| PwdVaultError::Storage(format!("Audit log lock poisoned: {}", e)))?;

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.log_path).map_err(|e| {
            PwdVaultError::Io(format!("Cannot open {}: {}", self.log_path.display(), e))
        })?;
        file.write_all(&line)
            .and_then(|()| file.flush())
            .map_err(|e| PwdVaultError::Io(format!("Cannot append audit entry: {}", e)))
    }

    /// Every entry, oldest first
    pub fn read_all(&self) -> PwdVaultResult<Vec<AuditEntry>> {
        let contents = match fs::read_to_string(&self.log_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PwdVaultError::Io(format!(
                    "Cannot read {}: {}",
                    self.log_path.display(),
                    e
                )))
            }
        };

        let lines: Vec<(usize, &str)> = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .collect();
        let last = lines.len().saturating_sub(1);

        let mut entries = Vec::with_capacity(lines.len());
        for (position, (index, line)) in lines.into_iter().enumerate() {
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) if position == last && !contents.ends_with('\n') => {
                    warn!(line = index + 1, error = %e, "Skipping torn audit log line");
                }
                Err(e) => {
                    return Err(PwdVaultError::Json(format!(
                        "Corrupt audit entry at line {}: {}",
                        index + 1,
                        e
                    )))
                }
            }
        }

        Ok(entries)
    }

    /// The last `count` entries, oldest first
    pub fn read_recent(&self, count: usize) -> PwdVaultResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }
}
