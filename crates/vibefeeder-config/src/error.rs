//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file {path} does not exist")]
    MissingFile {
        /// Requested path.
        path: PathBuf,
    },

    /// The config file exists but could not be read.
    #[error("cannot read config file {path}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Only `.toml` and `.json` files are understood.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The TOML source does not match the schema.
    #[error("malformed TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The JSON source does not match the schema.
    #[error("malformed JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// `.env` exists but is malformed.
    #[error("cannot load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A recognised environment variable holds a value of the wrong type.
    #[error("environment variable {var}: {reason}")]
    Env {
        /// Variable name as it appeared in the environment.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A setting failed validation after every source was applied.
    #[error("{field} {reason}")]
    Invalid {
        /// Dotted setting path, e.g. `server.max_body_bytes`.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn env(var: &str, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_message_names_variable() {
        let err = ConfigError::env("SERVER_MAX_BODY_BYTES", "expected integer");
        assert_eq!(
            err.to_string(),
            "environment variable SERVER_MAX_BODY_BYTES: expected integer"
        );
    }

    #[test]
    fn test_invalid_message() {
        let err = ConfigError::Invalid {
            field: "server.address",
            reason: "must not be empty",
        };
        assert_eq!(err.to_string(), "server.address must not be empty");
    }

    #[test]
    fn test_toml_error_conversion() {
        let err: ConfigError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
