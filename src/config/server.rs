use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ScanConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub scan: ScanConfig,
}

impl ServerConfig {
    /// Loads a TOML config file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scan.validate()
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("spaceport.db")
    }

    #[must_use]
    pub fn admin_token_path(&self) -> PathBuf {
        self.data_dir.join(".admin_token")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            scan: ScanConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            port = 9090

            [scan]
            gemini_url = "http://gemini.test"
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert!(config.scan.enabled());
        assert_eq!(config.scan.timeout_secs, 10);
        assert_eq!(config.db_path(), PathBuf::from("./data/spaceport.db"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = ServerConfig::from_toml("port = \"not a number\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_scan_timeout_rejected() {
        let result = ServerConfig::from_toml("[scan]\ntimeout_secs = 0\n");
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("timeout_secs")));

        let mut config = ServerConfig::default();
        config.scan.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scan_disabled_by_default() {
        let config = ServerConfig::default();
        assert!(!config.scan.enabled());
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }
}
