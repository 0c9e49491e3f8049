//! Request metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `vibefeeder_requests_total` | Counter | `method`, `status` |
//! | `vibefeeder_request_duration_seconds` | Histogram | `method` |
//!
//! Recording is a no-op until a recorder is installed, so callers never
//! need to check whether metrics are enabled.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "vibefeeder_requests_total";

/// Request latency histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "vibefeeder_request_duration_seconds";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder as the global metrics recorder.
///
/// # Errors
///
/// Returns [`TelemetryError::MetricsInit`] if another recorder is installed.
pub fn install_prometheus() -> TelemetryResult<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests processed");
    describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if [`install_prometheus`] has not been called.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Records a completed request.
pub fn record_request(method: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string())
        .record(duration.as_secs_f64());
}
