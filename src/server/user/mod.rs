mod codebases;
mod me;
mod spaces;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(me::get_me))
        // Spaces
        .route("/spaces", get(spaces::list_spaces))
        .route("/spaces", post(spaces::create_space))
        .route("/spaces/{space_id}", get(spaces::get_space))
        // Space codebases
        .route(
            "/spaces/{space_id}/codebases",
            get(codebases::list_space_codebases),
        )
        .route(
            "/spaces/{space_id}/codebases",
            post(codebases::create_space_codebase),
        )
        // Codebases
        .route("/codebases/{codebase_id}", get(codebases::get_codebase))
}
