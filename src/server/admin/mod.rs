mod identities;
mod tokens;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Identity routes
        .route("/identities", post(identities::create_identity))
        .route("/identities", get(identities::list_identities))
        .route("/identities/{id}", get(identities::get_identity))
        .route("/identities/{id}", delete(identities::delete_identity))
        .route(
            "/identities/{id}/tokens",
            get(identities::list_identity_tokens),
        )
        .route(
            "/identities/{id}/tokens",
            post(identities::create_identity_token),
        )
        // Token routes
        .route("/tokens", get(tokens::list_tokens))
        .route("/tokens/{id}", get(tokens::get_token))
        .route("/tokens/{id}", delete(tokens::delete_token))
}
