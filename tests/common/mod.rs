#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use spaceport::auth::TokenGenerator;
use spaceport::scan::{FixtureTransport, GeminiClient, ScanClient};
use spaceport::server::{AppState, create_router};
use spaceport::store::{SqliteStore, Store};
use spaceport::types::{Identity, SYSTEM_LEGACY_TEMPLATE_ID, Space};

pub const GEMINI_URL: &str = "http://gemini.test";

pub fn cassette_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata/gemini-scan")
        .join(format!("{name}.yaml"))
}

/// Scanner replaying the named cassette from `testdata/gemini-scan`.
pub fn fixture_scanner(cassette: &str) -> Arc<dyn ScanClient> {
    let transport =
        FixtureTransport::from_file(cassette_path(cassette)).expect("load scan cassette");
    Arc::new(GeminiClient::new(GEMINI_URL, Arc::new(transport)))
}

pub struct TestApp {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub router: Router,
    pub admin_token: String,
}

impl TestApp {
    /// App wired to a scanner that reports every repository as enrolled.
    pub fn new() -> Self {
        Self::with_scanner(Some(fixture_scanner("space-codebase-created")))
    }

    pub fn with_scanner(scanner: Option<Arc<dyn ScanClient>>) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store =
            Arc::new(SqliteStore::new(temp_dir.path().join("spaceport.db")).expect("open store"));
        store.initialize().expect("initialize store");

        let (token, admin_token) = TokenGenerator::new()
            .issue(true, None, None)
            .expect("issue admin token");
        store.create_token(&token).expect("store admin token");

        let mut state = AppState::new(store.clone() as Arc<dyn Store>);
        if let Some(scanner) = scanner {
            state = state.with_scanner(scanner);
        }
        let router = create_router(Arc::new(state));

        Self {
            temp_dir,
            store,
            router,
            admin_token,
        }
    }

    /// Creates an identity directly in the store and returns it with a fresh token.
    pub fn identity(&self, username: &str) -> (Identity, String) {
        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store
            .create_identity(&identity)
            .expect("create identity");

        let (token, raw) = TokenGenerator::new()
            .issue(false, Some(identity.id.clone()), None)
            .expect("issue token");
        self.store.create_token(&token).expect("store token");

        (identity, raw)
    }

    pub fn space(&self, owner: &Identity, name: &str) -> Space {
        let now = Utc::now();
        let space = Space {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            owner_id: owner.id.clone(),
            template_id: SYSTEM_LEGACY_TEMPLATE_ID.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.create_space(&space).expect("create space");
        space
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Posts a body verbatim with a JSON content type, well-formed or not.
    pub async fn post_raw(&self, uri: &str, token: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request");
        into_parts(self.router.clone().oneshot(request).await.expect("router response")).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(self.router.clone(), method, uri, token, body).await
    }
}

/// Sends one request through a router and decodes the JSON body.
/// Empty bodies decode as `Value::Null`.
pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = router.oneshot(request).await.expect("router response");
    into_parts(response).await
}

async fn into_parts(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, value)
}
