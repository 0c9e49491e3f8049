//! Configuration loader with layered approach.

use std::env;
use std::fs;
use std::path::Path;

use vibefeeder_telemetry::LogFormat;

use crate::{ConfigError, VibefeederConfig};

const ENV_PREFIX: &str = "VIBEFEEDER";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values
/// 2. Configuration file or string (TOML or JSON)
/// 3. `.env` file, loaded into the process environment
/// 4. Environment variables
///
/// # Example
///
/// ```
/// use vibefeeder_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_string("[server]\naddress = \"127.0.0.1:3000\"", "toml")
///     .unwrap()
///     .with_vars([("LOG_LEVEL", "debug")])
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert_eq!(config.server.address, "127.0.0.1:3000");
/// assert_eq!(config.log.level, "debug");
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: VibefeederConfig,
    read_env: bool,
}

impl ConfigLoader {
    /// Create a loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(format.to_string()))
            }
        };
        Ok(self)
    }

    /// Load a `.env` file from the working directory into the environment.
    ///
    /// A missing file is not an error. Variables already set are kept.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply process environment variables when [`load`](Self::load) runs.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.read_env = true;
        self
    }

    /// Apply the given variables now, as if they were set in the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Env` if a recognised variable holds
    /// an unparseable value.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            self.apply_env_var(key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Finalize and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed or
    /// validation fails.
    pub fn load(mut self) -> Result<VibefeederConfig, ConfigError> {
        if self.read_env {
            self = self.with_vars(env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    fn parse_file(content: &str, path: &Path) -> Result<VibefeederConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        // Flat names mirror the deployment environment, where empty means unset.
        match key {
            "SERVER_ADDRESS" | "LOG_LEVEL" | "LOG_FORMAT" | "AUTH_COOKIE_SECURE"
                if value.is_empty() =>
            {
                return Ok(());
            }
            "SERVER_ADDRESS" => return self.set(&["SERVER", "ADDRESS"], key, value),
            "LOG_LEVEL" => return self.set(&["LOG", "LEVEL"], key, value),
            "LOG_FORMAT" => return self.set(&["LOG", "FORMAT"], key, value),
            "AUTH_COOKIE_SECURE" => {
                self.config.auth.cookie_secure = value == "true";
                return Ok(());
            }
            _ => {}
        }

        let Some(path) = key
            .strip_prefix(ENV_PREFIX)
            .and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };
        let parts: Vec<&str> = path.split("__").collect();
        self.set(&parts, key, value)
    }

    fn set(&mut self, parts: &[&str], key: &str, value: &str) -> Result<(), ConfigError> {
        let config = &mut self.config;
        match parts {
            ["SERVER", "ADDRESS"] => config.server.address = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env(key, "expected integer"))?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = value
                    .parse()
                    .map_err(|_| ConfigError::env(key, "expected integer"))?;
            }
            ["LOG", "ENABLED"] => {
                config.log.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }
            ["LOG", "LEVEL"] => config.log.level = value.to_string(),
            ["LOG", "FORMAT"] => config.log.format = LogFormat::parse(value),
            ["AUTH", "COOKIE_SECURE"] => {
                config.auth.cookie_secure = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }
            ["STATIC", "DIR"] => config.assets.dir = value.into(),
            ["STATIC", "MANIFEST"] => config.assets.manifest = value.into(),
            _ => {}
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.server.address, "localhost:8080");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"server": {"address": "127.0.0.1:3000"}, "log": {"format": "text"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.address, "127.0.0.1:3000");
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn test_loader_with_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[auth]\ncookie_secure = true").unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert!(config.auth.cookie_secure);
    }

    #[test]
    fn test_loader_with_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            ConfigLoader::new().with_file(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        assert!(matches!(
            ConfigLoader::new().with_file("/nonexistent/config.toml"),
            Err(ConfigError::MissingFile { .. })
        ));
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/config.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.address, "localhost:8080");
    }

    #[test]
    fn test_flat_vars() {
        let config = ConfigLoader::new()
            .with_vars([
                ("SERVER_ADDRESS", "0.0.0.0:9000"),
                ("LOG_LEVEL", "warn"),
                ("LOG_FORMAT", "TEXT"),
                ("UNRELATED", "x"),
            ])
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.address, "0.0.0.0:9000");
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn test_flat_cookie_secure_requires_literal_true() {
        let secure = |value: &str| {
            ConfigLoader::new()
                .with_vars([("AUTH_COOKIE_SECURE", value)])
                .unwrap()
                .load()
                .unwrap()
                .auth
                .cookie_secure
        };
        assert!(secure("true"));
        assert!(!secure("TRUE"));
        assert!(!secure("1"));
        assert!(!secure(""));
    }

    #[test]
    fn test_empty_flat_var_is_unset() {
        let config = ConfigLoader::new()
            .with_vars([("SERVER_ADDRESS", "")])
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.address, "localhost:8080");
    }

    #[test]
    fn test_nested_vars_override_file() {
        let config = ConfigLoader::new()
            .with_string("[server]\nshutdown_timeout_secs = 30", "toml")
            .unwrap()
            .with_vars([
                ("VIBEFEEDER__SERVER__SHUTDOWN_TIMEOUT_SECS", "5"),
                ("VIBEFEEDER__STATIC__DIR", "public"),
            ])
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.shutdown_timeout_secs, 5);
        assert_eq!(config.assets.dir, std::path::PathBuf::from("public"));
    }

    #[test]
    fn test_invalid_integer_var() {
        let result =
            ConfigLoader::new().with_vars([("VIBEFEEDER__SERVER__MAX_BODY_BYTES", "lots")]);
        assert!(matches!(result, Err(ConfigError::Env { .. })));
    }

    #[test]
    fn test_validation_runs_on_load() {
        let result = ConfigLoader::new()
            .with_vars([("VIBEFEEDER__SERVER__MAX_BODY_BYTES", "0")])
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
