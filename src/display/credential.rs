//! Credential display formatting
//!
//! Formats credential metadata for terminal output. Passwords are never
//! part of these views.

use crate::models::Credential;

/// Format a list of credentials as a table
pub fn format_credential_list(credentials: &[Credential]) -> String {
    if credentials.is_empty() {
        return "No credentials stored.".to_string();
    }

    let category_width = column_width("Category", credentials.iter().map(|c| &c.app_category));
    let app_width = column_width("Application", credentials.iter().map(|c| &c.app_name));
    let user_width = column_width("User", credentials.iter().map(|c| &c.user_name));

    let mut output = String::new();
    output.push_str(&format!(
        "{:<category_width$}  {:<app_width$}  {:<user_width$}  {}\n",
        "Category", "Application", "User", "Updated",
    ));
    output.push_str(&format!(
        "{:-<category_width$}  {:-<app_width$}  {:-<user_width$}  {:-<16}\n",
        "", "", "", "",
    ));

    for credential in credentials {
        output.push_str(&format!(
            "{:<category_width$}  {:<app_width$}  {:<user_width$}  {}\n",
            credential.app_category,
            credential.app_name,
            credential.user_name,
            credential.update_time.format("%Y-%m-%d %H:%M"),
        ));
    }

    output.push_str(&format!("\nTotal: {} credential(s)", credentials.len()));
    output
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a String>) -> usize {
    values
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.len())
}

/// Format a single credential's metadata
pub fn format_credential_details(credential: &Credential) -> String {
    format!(
        "Application: {}\nUser:        {}\nCategory:    {}\nIcon:        {}\nID:          {}\nCreated:     {}\nUpdated:     {}",
        credential.app_name,
        credential.user_name,
        credential.app_category,
        credential.icon_name,
        credential.id,
        credential.creation_time.format("%Y-%m-%d %H:%M:%S UTC"),
        credential.update_time.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
