use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{RequireAdmin, TokenGenerator};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{
    CreateIdentityRequest, CreateIdentityTokenRequest, CreateTokenResponse, PaginationParams,
    TokenResponse,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::validation::validate_username;
use crate::types::Identity;

pub async fn create_identity(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateIdentityRequest>,
) -> impl IntoResponse {
    validate_username(&req.username)?;

    let now = Utc::now();
    let identity = Identity {
        id: Uuid::new_v4().to_string(),
        username: req.username,
        created_at: now,
        updated_at: now,
    };

    match state.store.create_identity(&identity) {
        Ok(()) => {}
        Err(Error::AlreadyExists) => {
            return Err(ApiError::conflict("Identity with this username already exists"));
        }
        Err(e) => {
            tracing::error!("Failed to create identity: {e}");
            return Err(ApiError::internal("Failed to create identity"));
        }
    }

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(identity))))
}

pub async fn list_identities(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let identities = state
        .store
        .list_identities(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list identities")?;

    let (identities, next_cursor, has_more) =
        paginate(identities, DEFAULT_PAGE_SIZE as usize, |i| i.id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        identities,
        next_cursor,
        has_more,
    )))
}

pub async fn get_identity(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let identity = state
        .store
        .get_identity(&id)
        .api_err("Failed to get identity")?
        .or_not_found("Identity not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(identity)))
}

pub async fn delete_identity(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_identity(&id)
        .api_err("Failed to delete identity")?;

    if !deleted {
        return Err(ApiError::not_found("Identity not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_identity_tokens(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_identity(&id)
        .api_err("Failed to get identity")?
        .or_not_found("Identity not found")?;

    let tokens: Vec<TokenResponse> = state
        .store
        .list_identity_tokens(&id)
        .api_err("Failed to list tokens")?
        .into_iter()
        .map(TokenResponse::from)
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(tokens)))
}

pub async fn create_identity_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateIdentityTokenRequest>,
) -> impl IntoResponse {
    let identity = state
        .store
        .get_identity(&id)
        .api_err("Failed to get identity")?
        .or_not_found("Identity not found")?;

    let expires_at = match req.expires_in_seconds {
        Some(secs) if secs <= 0 => {
            return Err(ApiError::bad_request("expires_in_seconds must be positive"));
        }
        Some(secs) => Some(Utc::now() + Duration::seconds(secs)),
        None => None,
    };

    let generator = TokenGenerator::new();
    let (token, raw_token) = generator
        .issue(false, Some(identity.id), expires_at)
        .api_err("Failed to generate token")?;

    state
        .store
        .create_token(&token)
        .api_err("Failed to create token")?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateTokenResponse {
            token: raw_token,
            metadata: TokenResponse::from(token),
        })),
    ))
}
