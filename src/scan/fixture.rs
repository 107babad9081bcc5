use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use super::ScanError;
use super::transport::{ScanTransport, TransportRequest, TransportResponse};

/// A recorded set of HTTP exchanges, stored as YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct Cassette {
    pub interactions: Vec<Interaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub request: RecordedRequest,
    pub response: RecordedResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    /// When set, the outgoing JSON body must match exactly.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordedResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: String,
}

fn default_status() -> u16 {
    200
}

/// Replays recorded interactions instead of touching the network.
/// Interactions are matched by method and URL and may be replayed any number
/// of times.
pub struct FixtureTransport {
    interactions: Vec<Interaction>,
}

impl FixtureTransport {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Fixture(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ScanError> {
        let cassette: Cassette =
            serde_yaml::from_str(text).map_err(|e| ScanError::Fixture(e.to_string()))?;
        Ok(Self::new(cassette.interactions))
    }

    #[must_use]
    pub fn new(interactions: Vec<Interaction>) -> Self {
        Self { interactions }
    }

    fn find(&self, request: &TransportRequest) -> Option<&Interaction> {
        self.interactions.iter().find(|i| {
            i.request.method.eq_ignore_ascii_case(request.method.as_str())
                && i.request.url == request.url
                && i.request.body.as_ref().is_none_or(|b| *b == request.body)
        })
    }
}

#[async_trait]
impl ScanTransport for FixtureTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ScanError> {
        let interaction = self.find(&request).ok_or_else(|| ScanError::NoRecording {
            method: request.method.to_string(),
            url: request.url.clone(),
        })?;

        Ok(TransportResponse {
            status: interaction.response.status,
            body: interaction.response.body.clone(),
        })
    }
}
