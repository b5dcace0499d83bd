/// Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Exchange host
    pub host: String,
    /// Exchange port
    pub port: u16,
    /// Connect timeout in milliseconds, 0 waits forever
    pub connect_timeout_ms: u64,
    /// Per-read idle timeout in milliseconds, 0 waits forever
    pub read_timeout_ms: u64,
    /// Where the final record list is written
    pub output: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            connect_timeout_ms: 5_000,
            read_timeout_ms: 10_000,
            output: PathBuf::from("stock_data.json"),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file; missing keys take defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("read {}: {e}", path.display())))?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ClientError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.read_timeout_ms)
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.addr(), "localhost:3000");
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.output, PathBuf::from("stock_data.json"));
    }

    #[test]
    fn test_zero_disables_timeout() {
        let config = ClientConfig {
            read_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.read_timeout(), None);
    }

    #[test]
    fn test_partial_toml() {
        let config: ClientConfig = toml::from_str("port = 4000\nhost = \"10.0.0.5\"\n").unwrap();
        assert_eq!(config.addr(), "10.0.0.5:4000");
        assert_eq!(config.read_timeout_ms, 10_000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        let config = ClientConfig {
            port: 3100,
            output: PathBuf::from("out/trades.json"),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ClientConfig::load("/nonexistent/client.toml");
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
