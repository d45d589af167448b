//! Terminal display formatting

pub mod credential;

pub use credential::{format_credential_details, format_credential_list};
