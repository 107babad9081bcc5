use axum::{Json, response::IntoResponse};

use crate::auth::RequireIdentity;
use crate::server::response::ApiResponse;

pub async fn get_me(auth: RequireIdentity) -> impl IntoResponse {
    Json(ApiResponse::success(auth.identity))
}
