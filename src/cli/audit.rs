//! Audit log viewing

use crate::audit::AuditLogger;
use crate::error::PwdVaultResult;

/// Print the most recent audit entries, oldest first
pub fn handle_audit(logger: &AuditLogger, limit: usize) -> PwdVaultResult<()> {
    let entries = logger.read_recent(limit)?;
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
