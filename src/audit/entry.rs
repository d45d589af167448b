//! Audit entry data structures
//!
//! Entries never carry key bytes, plaintexts or ciphertexts; `details` holds
//! only operator-facing context such as a category change or the reason a
//! step failed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    /// Credential rows and secret store disagree after a partial failure
    Inconsistency,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Inconsistency => "INCONSISTENCY",
        })
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Credential,
    EncryptionKey,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Credential => "Credential",
            Self::EncryptionKey => "EncryptionKey",
        })
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    /// Credential id, or the application name for keys
    pub entity_id: String,

    /// Human-readable description (e.g. "GitHub (alice)")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AuditEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        operation: Operation,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            details: None,
        }
    }

    /// Entry for a partial failure affecting `app_name`'s key
    pub fn inconsistency(app_name: &str, details: impl Into<String>) -> Self {
        Self::new(
            Operation::Inconsistency,
            EntityType::EncryptionKey,
            app_name,
            None,
        )
        .with_details(details)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// One line per entry, with details indented on a second line
    pub fn format_human_readable(&self) -> String {
        let subject = match &self.entity_name {
            Some(name) => format!("{} ({})", self.entity_id, name),
            None => self.entity_id.clone(),
        };
        let line = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            subject
        );

        match &self.details {
            Some(details) => format!("{}\n  {}", line, details),
            None => line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Operation::Inconsistency.to_string(), "INCONSISTENCY");
        assert_eq!(EntityType::EncryptionKey.to_string(), "EncryptionKey");
    }

    #[test]
    fn test_serialization() {
        let entry = AuditEntry::new(
            Operation::Create,
            EntityType::Credential,
            "cred-12345678",
            Some("GitHub (alice)".to_string()),
        );

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["operation"], "create");
        assert_eq!(json["entity_type"], "credential");
        assert!(json.get("details").is_none());

        let back: AuditEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back.operation, Operation::Create);
        assert_eq!(back.entity_name.as_deref(), Some("GitHub (alice)"));
    }

    #[test]
    fn test_inconsistency_entry() {
        let entry = AuditEntry::inconsistency("github", "orphaned key");
        assert_eq!(entry.operation, Operation::Inconsistency);
        assert_eq!(entry.entity_type, EntityType::EncryptionKey);
        assert_eq!(entry.entity_id, "github");

        let formatted = entry.format_human_readable();
        assert!(formatted.contains("INCONSISTENCY EncryptionKey github"));
        assert!(formatted.contains("orphaned key"));
    }
}
