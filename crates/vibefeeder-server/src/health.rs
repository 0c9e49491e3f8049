//! The `/healthz` endpoint.
//!
//! Liveness is the conjunction of registered [`HealthProbe`]s. With no
//! probes the service reports healthy.
//!
//! # Example
//!
//! ```rust
//! use vibefeeder_server::{FnProbe, HealthCheck};
//!
//! # tokio_test::block_on(async {
//! let health = HealthCheck::new()
//!     .with_probe(FnProbe::new("config", || Ok(())))
//!     .with_probe(FnProbe::new("database", || Err("connection refused".to_string())));
//!
//! let report = health.check().await;
//! assert!(!report.is_healthy());
//! assert_eq!(report.error(), Some("connection refused"));
//! # });
//! ```

use std::sync::Arc;

use http::StatusCode;
use serde_json::json;
use vibefeeder_middleware::{BoxFuture, Response, ResponseExt};

/// A downstream dependency whose availability determines liveness.
pub trait HealthProbe: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Checks the dependency, returning the failure reason if it is down.
    fn check(&self) -> BoxFuture<'_, Result<(), String>>;
}

/// A probe backed by a synchronous closure.
pub struct FnProbe<F> {
    name: String,
    check: F,
}

impl<F> FnProbe<F>
where
    F: Fn() -> Result<(), String> + Send + Sync,
{
    /// Creates a probe named `name`.
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> HealthProbe for FnProbe<F>
where
    F: Fn() -> Result<(), String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self) -> BoxFuture<'_, Result<(), String>> {
        let result = (self.check)();
        Box::pin(async move { result })
    }
}

/// Outcome of running every probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    error: Option<String>,
}

impl HealthReport {
    /// Returns `true` if every probe passed.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }

    /// The first failure reason.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 200 `{"status":"healthy"}` or 503 `{"status":"unhealthy","error":..}`.
    #[must_use]
    pub fn into_response(self) -> Response {
        match self.error {
            None => Response::json(StatusCode::OK, &json!({ "status": "healthy" })),
            Some(error) => Response::json(
                StatusCode::SERVICE_UNAVAILABLE,
                &json!({ "status": "unhealthy", "error": error }),
            ),
        }
    }
}

/// The registered probes.
#[derive(Clone, Default)]
pub struct HealthCheck {
    probes: Vec<Arc<dyn HealthProbe>>,
}

impl std::fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCheck")
            .field("probes", &self.probes.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl HealthCheck {
    /// Creates a check with no probes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a probe.
    #[must_use]
    pub fn with_probe(mut self, probe: impl HealthProbe + 'static) -> Self {
        self.probes.push(Arc::new(probe));
        self
    }

    /// Number of probes.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Runs the probes in order, stopping at the first failure.
    pub async fn check(&self) -> HealthReport {
        for probe in &self.probes {
            if let Err(error) = probe.check().await {
                tracing::warn!(probe = probe.name(), error = %error, "Health probe failed");
                return HealthReport { error: Some(error) };
            }
        }
        HealthReport { error: None }
    }
}
