//! CVE scan enrollment for codebases.
//!
//! Codebase creation talks to the scanner through [`ScanClient`], which is
//! injected into the server state. [`GeminiClient`] is the HTTP implementation;
//! it sends requests through a [`ScanTransport`], so tests can swap the network
//! for a [`FixtureTransport`] replaying recorded interactions.

mod fixture;
mod gemini;
mod transport;

use std::time::Duration;

use async_trait::async_trait;

pub use fixture::{Cassette, FixtureTransport, Interaction, RecordedRequest, RecordedResponse};
pub use gemini::GeminiClient;
pub use transport::{ReqwestTransport, ScanTransport, TransportRequest, TransportResponse};

/// Result of asking the scanner about a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub cve_scan: bool,
    pub summary: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("scan service returned status {0}")]
    Status(u16),
    #[error("failed to decode scan payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("scan timed out after {0:?}")]
    Timeout(Duration),
    #[error("no recorded interaction for {method} {url}")]
    NoRecording { method: String, url: String },
    #[error("invalid scan fixture: {0}")]
    Fixture(String),
}

#[async_trait]
pub trait ScanClient: Send + Sync {
    async fn scan(&self, repository_url: &str) -> Result<ScanReport, ScanError>;
}
