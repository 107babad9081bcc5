use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireIdentity;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::CreateSpaceRequest;
use crate::server::response::{
    ApiError, ApiResponse, OffsetPage, OffsetParams, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::validate_space_name;
use crate::types::{SYSTEM_LEGACY_TEMPLATE_ID, Space};

pub async fn create_space(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSpaceRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_space_name(&req.name)?;

    let now = Utc::now();
    let space = Space {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        description: req.description.filter(|d| !d.trim().is_empty()),
        owner_id: auth.identity.id.clone(),
        template_id: req
            .template_id
            .unwrap_or_else(|| SYSTEM_LEGACY_TEMPLATE_ID.to_string()),
        created_at: now,
        updated_at: now,
    };

    match store.create_space(&space) {
        Ok(()) => {}
        Err(Error::AlreadyExists) => {
            return Err(ApiError::conflict("You already own a space with this name"));
        }
        Err(e) => {
            tracing::error!("Failed to create space: {e}");
            return Err(ApiError::internal("Failed to create space"));
        }
    }

    tracing::info!(space_id = %space.id, owner_id = %space.owner_id, "Created space");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(space))))
}

pub async fn get_space(
    State(state): State<Arc<AppState>>,
    Path(space_id): Path<String>,
) -> impl IntoResponse {
    let space = state
        .store
        .get_space(&space_id)
        .api_err("Failed to get space")?
        .or_not_found("Space not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(space)))
}

pub async fn list_spaces(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OffsetParams>,
) -> impl IntoResponse {
    let window = params.window()?;
    let store = state.store.as_ref();

    let total = store.count_spaces().api_err("Failed to count spaces")?;
    let spaces = store
        .list_spaces(window.offset, window.limit)
        .api_err("Failed to list spaces")?;

    Ok::<_, ApiError>(Json(OffsetPage::new(spaces, total, window)))
}
