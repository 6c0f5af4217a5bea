//! Credential management for website logins

mod service;
mod types;

pub use service::CredentialService;
pub use types::*;
