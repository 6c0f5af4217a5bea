//! # vault-server
//!
//! HTTP API for passvault. Request handlers resolve the caller from the
//! `x-user-id` header set by the upstream identity provider and delegate to
//! [`vault_core::CredentialService`].

mod error;
pub mod routes;
mod server;

pub use error::ApiError;
pub use routes::{router, AppState, OWNER_HEADER};
pub use server::VaultServer;
