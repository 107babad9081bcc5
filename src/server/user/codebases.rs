use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{OptionalIdentity, RequireIdentity};
use crate::error::Error;
use crate::scan::ScanClient;
use crate::server::AppState;
use crate::server::dto::{CodebaseResource, CreateCodebaseRequest};
use crate::server::response::{
    ApiError, ApiResponse, OffsetPage, OffsetParams, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::{validate_codebase_kind, validate_codebase_url, validate_stack_id};
use crate::store::Store;
use crate::types::{Codebase, DEFAULT_CODEBASE_KIND};

/// Creates a codebase under a space. Only the space owner may do this, and a
/// space holds any given URL at most once.
pub async fn create_space_codebase(
    auth: RequireIdentity,
    State(state): State<Arc<AppState>>,
    Path(space_id): Path<String>,
    payload: Result<Json<CreateCodebaseRequest>, JsonRejection>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let space = store
        .get_space(&space_id)
        .api_err("Failed to get space")?
        .or_not_found("Space not found")?;

    if !space.is_owned_by(&auth.identity) {
        return Err(ApiError::forbidden(
            "Only the space owner can add codebases to this space",
        ));
    }

    // Body problems rank below the space and ownership checks.
    let Json(req) = payload.map_err(|rejection| {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let url = validate_codebase_url(&req.url)?;
    if let Some(stack_id) = &req.stack_id {
        validate_stack_id(stack_id)?;
    }
    let kind = match req.kind {
        Some(kind) => {
            validate_codebase_kind(&kind)?;
            kind
        }
        None => DEFAULT_CODEBASE_KIND.to_string(),
    };

    let mut codebase = Codebase {
        id: Uuid::new_v4().to_string(),
        space_id: space.id,
        url,
        stack_id: req.stack_id,
        kind,
        cve_scan: None,
        created_at: Utc::now(),
    };

    match store.create_codebase(&codebase) {
        Ok(()) => {}
        Err(Error::AlreadyExists) => {
            return Err(ApiError::conflict(
                "A codebase with this URL already exists in the space",
            ));
        }
        // The space vanished between the lookup and the insert.
        Err(Error::NotFound) => return Err(ApiError::not_found("Space not found")),
        Err(e) => {
            tracing::error!("Failed to create codebase: {e}");
            return Err(ApiError::internal("Failed to create codebase"));
        }
    }

    tracing::info!(
        codebase_id = %codebase.id,
        space_id = %codebase.space_id,
        url = %codebase.url,
        "Created codebase"
    );

    if let Some(scanner) = &state.scanner {
        codebase.cve_scan = enroll_cve_scan(store, scanner.as_ref(), &codebase).await;
    }

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(CodebaseResource::from(codebase))),
    ))
}

/// Asks the scanner about a freshly stored codebase and records the result.
/// Scanner trouble never fails the request; it only leaves the flag unset.
async fn enroll_cve_scan(
    store: &dyn Store,
    scanner: &dyn ScanClient,
    codebase: &Codebase,
) -> Option<bool> {
    let report = match scanner.scan(&codebase.url).await {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(
                codebase_id = %codebase.id,
                url = %codebase.url,
                "CVE scan unavailable: {e}"
            );
            return None;
        }
    };

    if let Err(e) = store.set_codebase_cve_scan(&codebase.id, report.cve_scan) {
        tracing::warn!(codebase_id = %codebase.id, "Failed to record CVE scan result: {e}");
        return None;
    }

    Some(report.cve_scan)
}

pub async fn list_space_codebases(
    viewer: OptionalIdentity,
    State(state): State<Arc<AppState>>,
    Path(space_id): Path<String>,
    Query(params): Query<OffsetParams>,
) -> impl IntoResponse {
    let window = params.window()?;
    let store = state.store.as_ref();

    store
        .get_space(&space_id)
        .api_err("Failed to get space")?
        .or_not_found("Space not found")?;

    tracing::debug!(
        space_id = %space_id,
        viewer = viewer.0.as_ref().map_or("anonymous", |i| i.id.as_str()),
        "Listing codebases"
    );

    let total = store
        .count_codebases(&space_id)
        .api_err("Failed to count codebases")?;
    let codebases = store
        .list_codebases(&space_id, window.offset, window.limit)
        .api_err("Failed to list codebases")?;

    let resources: Vec<CodebaseResource> =
        codebases.into_iter().map(CodebaseResource::from).collect();

    Ok::<_, ApiError>(Json(OffsetPage::new(resources, total, window)))
}

pub async fn get_codebase(
    State(state): State<Arc<AppState>>,
    Path(codebase_id): Path<String>,
) -> impl IntoResponse {
    let codebase = state
        .store
        .get_codebase(&codebase_id)
        .api_err("Failed to get codebase")?
        .or_not_found("Codebase not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(CodebaseResource::from(codebase))))
}
