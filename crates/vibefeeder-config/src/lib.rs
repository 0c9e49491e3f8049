//! Layered configuration for the vibefeeder server.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. A TOML or JSON file
//! 3. A `.env` file
//! 4. Environment variables
//!
//! Unknown keys in files are rejected.
//!
//! # Example
//!
//! ```no_run
//! use vibefeeder_config::ConfigLoader;
//!
//! # fn main() -> Result<(), vibefeeder_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("vibefeeder.toml")?
//!     .with_dotenv()?
//!     .with_env()
//!     .load()?;
//!
//! println!("listening on {}", config.server.address);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! address = "0.0.0.0:8080"
//! shutdown_timeout_secs = 10
//! max_body_bytes = 2097152
//!
//! [log]
//! level = "info"
//! format = "json"
//!
//! [auth]
//! cookie_secure = true
//!
//! [static]
//! dir = "static"
//! manifest = "static/manifest.json"
//! ```
//!
//! # Environment Variables
//!
//! The deployment names `SERVER_ADDRESS`, `LOG_LEVEL`, `LOG_FORMAT` and
//! `AUTH_COOKIE_SECURE` are honoured, as is the nested form
//! `VIBEFEEDER__SECTION__KEY` for every key.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::VibefeederConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AuthConfig, LogSection, ServerConfig, StaticConfig};
pub use vibefeeder_telemetry::LogFormat;
