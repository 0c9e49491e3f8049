//! Structured request logging.
//!
//! The logger is the outermost stage. It forwards any downstream error to
//! the [`ErrorHandler`] first, so the status it records is the status the
//! client receives, then emits a single `HTTP request` event whose level
//! follows the status: error for 5xx, warn for 4xx, info otherwise.

use std::sync::Arc;
use std::time::Duration;

use http::{header, HeaderMap, Method, StatusCode};
use tracing::Level;
use vibefeeder_core::RequestId;
use vibefeeder_telemetry::record_request;

use crate::context::MiddlewareContext;
use crate::error_handler::ErrorHandler;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{MiddlewareResult, Request};

/// The facts logged for one completed request.
///
/// Attached to the response extensions and to the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLogRecord {
    /// Request method.
    pub method: Method,
    /// Request URI as received.
    pub uri: String,
    /// Final response status.
    pub status: StatusCode,
    /// Time from request start to finalized response.
    pub latency: Duration,
    /// Client address.
    pub remote_ip: String,
    /// `Host` header, or the URI authority.
    pub host: String,
    /// Request ID.
    pub request_id: RequestId,
    /// The error that produced the response, if any.
    pub error: Option<String>,
    /// Level the record was logged at.
    pub level: Level,
}

impl RequestLogRecord {
    /// Level for a response status.
    #[must_use]
    pub fn level_for(status: StatusCode) -> Level {
        if status.is_server_error() {
            Level::ERROR
        } else if status.is_client_error() {
            Level::WARN
        } else {
            Level::INFO
        }
    }

    fn emit(&self) {
        let method = &self.method;
        let uri = &self.uri;
        let status = self.status.as_u16();
        let latency_ms = self.latency.as_secs_f64() * 1000.0;
        let remote_ip = &self.remote_ip;
        let host = &self.host;
        let request_id = self.request_id;
        let error = self.error.as_deref();

        macro_rules! log_at {
            ($level:expr) => {
                tracing::event!(
                    $level,
                    %method,
                    %uri,
                    status,
                    latency_ms,
                    %remote_ip,
                    %host,
                    %request_id,
                    error,
                    "HTTP request"
                )
            };
        }

        match self.level {
            Level::ERROR => log_at!(Level::ERROR),
            Level::WARN => log_at!(Level::WARN),
            _ => log_at!(Level::INFO),
        }
    }
}

/// Logs every request and finalizes error responses.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    error_handler: Arc<ErrorHandler>,
}

impl RequestLogger {
    /// Creates the logger, converting errors with `error_handler`.
    #[must_use]
    pub fn new(error_handler: Arc<ErrorHandler>) -> Self {
        Self { error_handler }
    }
}

impl Middleware for RequestLogger {
    fn name(&self) -> &'static str {
        "request_logger"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            let method = request.method().clone();
            let uri = request.uri().to_string();
            let headers = request.headers().clone();
            let host = headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .or_else(|| request.uri().authority().map(ToString::to_string))
                .unwrap_or_default();
            let remote_ip = remote_ip(&headers, ctx);

            let result = next.run(ctx, request).await;
            let (mut response, error) = self.error_handler.finalize(ctx, &headers, result);

            let status = response.status();
            let record = RequestLogRecord {
                method,
                uri,
                status,
                latency: ctx.elapsed(),
                remote_ip,
                host,
                request_id: ctx.request_id(),
                error: error.map(|e| e.to_string()),
                level: RequestLogRecord::level_for(status),
            };

            record.emit();
            record_request(record.method.as_str(), status.as_u16(), record.latency);

            response.extensions_mut().insert(record.clone());
            ctx.set_extension(record);
            Ok(response)
        })
    }
}

/// The client address: first `X-Forwarded-For` entry, then `X-Real-IP`,
/// then the socket peer.
#[must_use]
pub fn remote_ip(headers: &HeaderMap, ctx: &MiddlewareContext) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| ctx.remote_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}
