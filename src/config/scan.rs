use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 10;

/// Settings for the external CVE scanning service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Base URL of the Gemini service. Scanning is disabled when unset.
    pub gemini_url: Option<String>,
    pub timeout_secs: u64,
}

impl ScanConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// A zero timeout would fail every scan before it starts.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "scan.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.gemini_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            gemini_url: None,
            timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
        }
    }
}
