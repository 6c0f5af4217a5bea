//! Error types for vault-core

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
///
/// Messages never carry key material or plaintext. Callers that talk to
/// clients should collapse everything except `Validation`, `NotFound` and
/// `Forbidden` into one opaque failure.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed sealed blob: {0}")]
    Format(String),

    #[error("Authentication failed - sealed blob was tampered with or the key is wrong")]
    Authentication,

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Credential {0} is owned by another user")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    /// Short, stable label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Format(_) => "format",
            Self::Authentication => "authentication",
            Self::Encryption(_) => "encryption",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Storage(_) => "storage",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}
