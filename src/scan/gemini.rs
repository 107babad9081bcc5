use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::transport::{ScanTransport, TransportRequest};
use super::{ScanClient, ScanError, ScanReport};

const SCAN_PATH: &str = "/api/v1/user-repo/scan";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ScanRepoRequest<'a> {
    #[serde(rename = "git-url")]
    git_url: &'a str,
    #[serde(rename = "email-ids")]
    email_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScanRepoResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    summary: Option<String>,
}

/// Client for the Gemini repository scanning service.
pub struct GeminiClient {
    base_url: String,
    transport: Arc<dyn ScanTransport>,
    timeout: Duration,
}

impl GeminiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn ScanTransport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Upper bound for one scan call, including the transport round trip.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn scan_url(&self) -> String {
        format!("{}{SCAN_PATH}", self.base_url)
    }
}

#[async_trait]
impl ScanClient for GeminiClient {
    async fn scan(&self, repository_url: &str) -> Result<ScanReport, ScanError> {
        let body = serde_json::to_value(ScanRepoRequest {
            git_url: repository_url,
            email_ids: Vec::new(),
        })?;

        let request = TransportRequest {
            method: Method::POST,
            url: self.scan_url(),
            body,
        };

        let response = tokio::time::timeout(self.timeout, self.transport.send(request))
            .await
            .map_err(|_| ScanError::Timeout(self.timeout))??;

        if !(200..300).contains(&response.status) {
            return Err(ScanError::Status(response.status));
        }

        let parsed: ScanRepoResponse = serde_json::from_str(&response.body)?;

        Ok(ScanReport {
            cve_scan: parsed.success,
            summary: parsed.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{FixtureTransport, TransportResponse};

    struct StalledTransport;

    #[async_trait]
    impl ScanTransport for StalledTransport {
        async fn send(&self, _request: TransportRequest) -> Result<TransportResponse, ScanError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(TransportResponse {
                status: 200,
                body: "{}".to_string(),
            })
        }
    }

    fn fixture(status: u16, body: &str) -> Arc<dyn ScanTransport> {
        let yaml = format!(
            "interactions:\n  - request:\n      method: POST\n      url: http://gemini.test/api/v1/user-repo/scan\n    response:\n      status: {status}\n      body: '{body}'\n"
        );
        Arc::new(FixtureTransport::from_yaml(&yaml).unwrap())
    }

    #[tokio::test]
    async fn test_scan_enrolled() {
        let client = GeminiClient::new(
            "http://gemini.test/",
            fixture(200, r#"{"success": true, "summary": "registered"}"#),
        );

        let report = client.scan("https://github.com/example/repo.git").await.unwrap();
        assert!(report.cve_scan);
        assert_eq!(report.summary.as_deref(), Some("registered"));
    }

    #[tokio::test]
    async fn test_scan_error_status() {
        let client = GeminiClient::new("http://gemini.test", fixture(503, "{}"));

        let result = client.scan("https://github.com/example/repo.git").await;
        assert!(matches!(result, Err(ScanError::Status(503))));
    }

    #[tokio::test]
    async fn test_scan_garbage_body() {
        let client = GeminiClient::new("http://gemini.test", fixture(200, "not json"));

        let result = client.scan("https://github.com/example/repo.git").await;
        assert!(matches!(result, Err(ScanError::Decode(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_times_out() {
        let client = GeminiClient::new("http://gemini.test", Arc::new(StalledTransport))
            .with_timeout(Duration::from_secs(2));

        let result = client.scan("https://github.com/example/repo.git").await;
        assert!(matches!(result, Err(ScanError::Timeout(d)) if d == Duration::from_secs(2)));
    }
}
