//! Configuration sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vibefeeder_telemetry::{LogConfig, LogFormat};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    #[serde(default = "default_address")]
    pub address: String,

    /// How long in-flight connections may drain after a shutdown signal.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_address() -> String {
    "localhost:8080".to_string()
}

const fn default_shutdown_timeout_secs() -> u64 {
    10
}

const fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// Whether logging is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum level: debug, info, warn, error.
    #[serde(default = "default_level")]
    pub level: String,

    /// `json` or `text`.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::Json,
        }
    }
}

impl LogSection {
    /// Converts to the logging subsystem's configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

/// Cookie and session settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Mark cookies `Secure`. Enable behind HTTPS.
    #[serde(default)]
    pub cookie_secure: bool,
}

/// Static asset settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    /// Directory served under `/static/`.
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// Asset manifest produced by `gen-asset-manifest`.
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            dir: default_static_dir(),
            manifest: default_manifest(),
        }
    }
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_manifest() -> PathBuf {
    PathBuf::from("static/manifest.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.address, "localhost:8080");
        assert_eq!(server.shutdown_timeout_secs, 10);
        assert_eq!(server.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let server: ServerConfig = toml::from_str("address = \"0.0.0.0:9000\"").unwrap();
        assert_eq!(server.address, "0.0.0.0:9000");
        assert_eq!(server.shutdown_timeout_secs, 10);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<AuthConfig>("cookie_secure = true\nsecret = 1").is_err());
    }

    #[test]
    fn test_log_format_is_lenient() {
        let log: LogSection = toml::from_str("format = \"TEXT\"").unwrap();
        assert_eq!(log.format, LogFormat::Text);
        let log: LogSection = toml::from_str("format = \"logfmt\"").unwrap();
        assert_eq!(log.format, LogFormat::Json);
    }
}
