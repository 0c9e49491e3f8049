//! Logging and request metrics for vibefeeder.
//!
//! - **Logging**: a global `tracing` subscriber writing either JSON or
//!   human-readable text, filtered by level.
//! - **Metrics**: request counters and latency histograms recorded through
//!   the `metrics` facade, optionally exported in Prometheus format.
//!
//! # Example
//!
//! ```rust,ignore
//! use vibefeeder_telemetry::{init_logging, LogConfig, LogFormat};
//!
//! init_logging(&LogConfig {
//!     enabled: true,
//!     level: "debug".to_string(),
//!     format: LogFormat::Text,
//! })?;
//! tracing::info!(address = "localhost:8080", "Starting server");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, parse_level, LogConfig, LogFormat};
pub use metrics::{install_prometheus, record_request, render_metrics};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
