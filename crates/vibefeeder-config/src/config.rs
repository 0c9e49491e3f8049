//! The root configuration type.

use serde::{Deserialize, Serialize};

use crate::{AuthConfig, ConfigError, LogSection, ServerConfig, StaticConfig};

/// Complete server configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use vibefeeder_config::VibefeederConfig;
///
/// let config = VibefeederConfig::default();
/// assert_eq!(config.server.address, "localhost:8080");
/// assert!(!config.auth.cookie_secure);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct VibefeederConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogSection,

    /// Cookie settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Static asset settings.
    #[serde(default, rename = "static")]
    pub assets: StaticConfig,
}

impl VibefeederConfig {
    /// Checks values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty listen address or
    /// a zero body limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.address.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "server.address",
                reason: "must not be empty",
            });
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "server.max_body_bytes",
                reason: "must be greater than zero",
            });
        }

        Ok(())
    }
}
