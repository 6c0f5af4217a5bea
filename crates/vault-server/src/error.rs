//! Mapping of core errors to HTTP responses
//!
//! Clients only ever see a handful of fixed messages. Tampered blobs, wrong
//! keys, malformed records and storage failures all collapse into the same
//! 500 body; the distinction is kept in the server log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use vault_core::VaultError;

/// Errors returned from request handlers
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Credential not found")]
    NotFound,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Validation(msg) => Self::BadRequest(msg),
            // Foreign records look exactly like missing ones
            VaultError::NotFound(_) | VaultError::Forbidden(_) => {
                warn!("Credential lookup refused ({})", err.kind());
                Self::NotFound
            }
            VaultError::Authentication | VaultError::Format(_) => {
                error!("Stored credential could not be opened: {}", err);
                Self::Internal
            }
            other => {
                error!("Request failed ({}): {}", other.kind(), other);
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_failures_are_indistinguishable() {
        let auth = ApiError::from(VaultError::Authentication);
        let format = ApiError::from(VaultError::Format("sealed blob is 3 bytes".to_string()));

        assert_eq!(auth, format);
        assert_eq!(auth.to_string(), "Internal server error");
        assert_eq!(auth.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_forbidden_maps_to_not_found() {
        let forbidden = ApiError::from(VaultError::Forbidden("id".to_string()));
        let missing = ApiError::from(VaultError::NotFound("id".to_string()));
        assert_eq!(forbidden, missing);
        assert_eq!(forbidden.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_keeps_message() {
        let err = ApiError::from(VaultError::Validation("Missing required fields".to_string()));
        assert_eq!(err, ApiError::BadRequest("Missing required fields".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_errors_are_opaque() {
        let err = ApiError::from(VaultError::Storage("disk full at /secret/path".to_string()));
        assert_eq!(err, ApiError::Internal);
        assert!(!err.to_string().contains("/secret/path"));
    }
}
