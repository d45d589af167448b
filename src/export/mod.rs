//! Export module for pwdvault
//!
//! Credential rows can be written out as CSV for spreadsheets or for
//! migrating to another password manager.

pub mod csv;

pub use self::csv::{export_credentials_csv, export_credentials_with_passwords_csv, CSV_HEADER};
