//! # Spaceport
//!
//! Spaces and their codebases for a work-item tracker, usable both as a
//! standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spaceport::scan::{GeminiClient, ReqwestTransport};
//! use spaceport::server::{AppState, create_router};
//! use spaceport::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/spaceport.db").unwrap();
//! store.initialize().unwrap();
//!
//! let transport = ReqwestTransport::new(std::time::Duration::from_secs(10)).unwrap();
//! let scanner = GeminiClient::new("https://gemini.example.com", Arc::new(transport));
//!
//! let state = Arc::new(AppState::new(Arc::new(store)).with_scanner(Arc::new(scanner)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): builds the `spaceport` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod scan;
pub mod server;
pub mod store;
pub mod types;
