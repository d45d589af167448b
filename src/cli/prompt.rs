//! Interactive terminal input
//!
//! Secrets are read without echo via rpassword.

use std::io::{self, BufRead, Write};

use crate::crypto::SecureString;
use crate::error::{PwdVaultError, PwdVaultResult};

/// Prompt for a secret without echoing it
pub fn read_secret(prompt: &str) -> PwdVaultResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::from)
        .map_err(|e| PwdVaultError::Io(format!("Failed to read input: {}", e)))
}

/// Prompt for a new password twice and require both entries to match
pub fn read_new_password() -> PwdVaultResult<SecureString> {
    let first = read_secret("Password: ")?;
    if first.is_empty() {
        return Err(PwdVaultError::InvalidArgument(
            "Password cannot be empty".into(),
        ));
    }

    let second = read_secret("Confirm password: ")?;
    if first.as_str() != second.as_str() {
        return Err(PwdVaultError::InvalidArgument(
            "Passwords do not match".into(),
        ));
    }
    Ok(first)
}

/// Ask a yes/no question; anything but "y"/"yes" is no
pub fn confirm(question: &str) -> PwdVaultResult<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
