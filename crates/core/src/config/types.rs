use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::poller::PollerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Quality level sent with each submission when none is given
    #[serde(default = "default_quality")]
    pub default_quality: u32,
}

fn default_quality() -> u32 {
    80
}

/// Conversion backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the conversion service (e.g., "http://localhost:5000")
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Per-request timeout in milliseconds. Unset means requests never time out.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_ms: None,
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

/// Where and how finished artifacts are delivered
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_true")]
    pub auto_download: bool,
    #[serde(default = "default_true")]
    pub show_previews: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            auto_download: true,
            show_previews: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("converted")
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.backend.url, "http://127.0.0.1:5000");
        assert!(config.backend.request_timeout_ms.is_none());
        assert_eq!(config.poller.progress_interval_ms, 2000);
        assert_eq!(config.poller.retry_interval_ms, 4000);
        assert_eq!(config.output.dir.to_str().unwrap(), "converted");
        assert!(config.output.auto_download);
        assert!(config.output.show_previews);
        assert_eq!(config.default_quality, 80);
    }

    #[test]
    fn test_deserialize_backend_section() {
        let toml = r#"
[backend]
url = "http://media.local:8080/"
request_timeout_ms = 15000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.url, "http://media.local:8080/");
        assert_eq!(config.backend.request_timeout_ms, Some(15000));
    }

    #[test]
    fn test_deserialize_output_section() {
        let toml = r#"
default_quality = 55

[output]
dir = "/tmp/out"
auto_download = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.dir.to_str().unwrap(), "/tmp/out");
        assert!(!config.output.auto_download);
        assert!(config.output.show_previews);
        assert_eq!(config.default_quality, 55);
    }

    #[test]
    fn test_deserialize_rejects_wrong_types() {
        let toml = r#"
[backend]
url = 42
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
