//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::Full;
use vibefeeder_core::AppError;

/// The HTTP request type used in the middleware pipeline.
///
/// The body is fully buffered by the server before the pipeline runs.
pub type Request = http::Request<Bytes>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// What every stage and handler produces.
pub type MiddlewareResult = Result<Response, AppError>;

/// Request extension set by the server when the body exceeded its read limit.
///
/// The body of such a request is truncated and must not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OversizedBody;

/// Request extension set by the server when reading the body failed, e.g. on
/// malformed chunked encoding. The body is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableBody {
    /// The transport error, for the log.
    pub reason: String,
}

/// Extension trait for building simple responses.
pub trait ResponseExt {
    /// A `text/plain` response.
    fn text(status: StatusCode, body: impl Into<String>) -> Response;

    /// An `application/json` response.
    fn json(status: StatusCode, body: &serde_json::Value) -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, body: impl Into<String>) -> Response {
        http::Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(body.into())))
            .expect("failed to build text response")
    }

    fn json(status: StatusCode, body: &serde_json::Value) -> Response {
        http::Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("failed to build JSON response")
    }
}
