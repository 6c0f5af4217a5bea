//! `/api/password` handlers

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use vault_core::{CredentialService, CredentialUpdate, NewCredential, OwnerId};

/// Header carrying the user id established by the upstream identity provider
pub const OWNER_HEADER: &str = "x-user-id";

/// Shared state for HTTP handlers
pub struct AppState {
    pub service: CredentialService,
}

/// Build the API router
pub fn router(service: CredentialService) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route(
            "/api/password",
            get(list_credentials)
                .post(create_credential)
                .put(update_credential)
                .delete(delete_credential),
        )
        .with_state(state)
}

/// Authenticated caller
pub struct Owner(pub OwnerId);

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        OwnerId::new(value)
            .map(Owner)
            .map_err(|_| ApiError::Unauthorized)
    }
}

/// Body accepted by POST and PUT
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CredentialRequest {
    pub website: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRequest")
            .field("website", &self.website)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// `?id=` query parameter
#[derive(Debug, Deserialize)]
pub struct IdParam {
    pub id: Option<String>,
}

/// Credential as returned to its owner
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub id: Uuid,
    pub website: String,
    pub username: String,
    pub password: String,
}

/// Health check endpoint
async fn health() -> &'static str {
    "OK"
}

async fn create_credential(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    body: Result<Json<CredentialRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.map_err(invalid_body)?;

    let new = NewCredential {
        website: body.website.unwrap_or_default(),
        username: body.username.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
    };

    let credential = state.service.add(&owner, new).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Credential stored successfully",
            "id": credential.id,
        })),
    ))
}

async fn list_credentials(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
) -> Result<Json<Vec<CredentialResponse>>, ApiError> {
    let credentials = state.service.list(&owner).await?;

    let response = credentials
        .into_iter()
        .map(|c| CredentialResponse {
            id: c.id,
            website: c.website,
            username: c.username,
            password: c.password.into_inner(),
        })
        .collect();

    Ok(Json(response))
}

async fn update_credential(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Query(params): Query<IdParam>,
    body: Result<Json<CredentialRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = required_id(params)?;
    let Json(body) = body.map_err(invalid_body)?;

    let update = CredentialUpdate {
        website: body.website,
        username: body.username,
        password: body.password,
    };

    let credential = state.service.update(&owner, id, update).await?;

    Ok(Json(json!({
        "message": "Credential updated successfully",
        "id": credential.id,
    })))
}

async fn delete_credential(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Query(params): Query<IdParam>,
) -> Result<Json<Value>, ApiError> {
    let id = required_id(params)?;

    state.service.delete(&owner, id).await?;

    Ok(Json(json!({ "message": "Credential deleted successfully" })))
}

fn required_id(params: IdParam) -> Result<Uuid, ApiError> {
    let raw = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing id parameter".to_string()))?;

    // A malformed id cannot name any record
    Uuid::parse_str(&raw).map_err(|_| ApiError::NotFound)
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    debug!("Rejected request body: {}", rejection);
    ApiError::BadRequest("Invalid request body".to_string())
}
