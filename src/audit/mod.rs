//! Audit logging for pwdvault
//!
//! Records credential and key lifecycle operations, plus any inconsistency
//! left behind by a partially failed operation, in an append-only JSONL file.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
