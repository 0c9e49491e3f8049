//! Request body size limit.

use http::header;
use vibefeeder_core::HttpError;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{MiddlewareResult, OversizedBody, Request, UnreadableBody};

/// Default limit: 2 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Rejects requests whose body exceeds a byte limit with 413.
///
/// A request is over the limit when its `Content-Length` says so, when the
/// server flagged it with [`OversizedBody`] while reading, or when the
/// buffered body is longer than the limit. A body the server could not read
/// at all ([`UnreadableBody`]) is rejected with 400.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit {
    limit: usize,
}

impl BodyLimit {
    /// Creates the stage with `limit` bytes.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Returns the limit in bytes.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    fn exceeded(&self, request: &Request) -> bool {
        let declared = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        declared.is_some_and(|len| len > self.limit as u64)
            || request.extensions().get::<OversizedBody>().is_some()
            || request.body().len() > self.limit
    }
}

impl Default for BodyLimit {
    fn default() -> Self {
        Self::new(DEFAULT_BODY_LIMIT)
    }
}

impl Middleware for BodyLimit {
    fn name(&self) -> &'static str {
        "body_limit"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            if let Some(unreadable) = request.extensions().get::<UnreadableBody>() {
                tracing::debug!(error = %unreadable.reason, "Failed to read request body");
                return Err(HttpError::bad_request("failed to read request body").into());
            }
            if self.exceeded(&request) {
                return Err(HttpError::payload_too_large("The request body is too large.").into());
            }
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Response, ResponseExt};
    use bytes::Bytes;
    use http::StatusCode;

    fn ok() -> Next<'static> {
        Next::handler(|_ctx, _req| Box::pin(async { Ok(Response::text(StatusCode::OK, "ok")) }))
    }

    async fn run(limit: BodyLimit, request: Request) -> MiddlewareResult {
        let mut ctx = MiddlewareContext::new();
        limit.process(&mut ctx, request, ok()).await
    }

    #[tokio::test]
    async fn test_within_limit() {
        let request = http::Request::post("/")
            .header(header::CONTENT_LENGTH, "4")
            .body(Bytes::from_static(b"data"))
            .unwrap();
        assert!(run(BodyLimit::new(4), request).await.is_ok());
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let request = http::Request::post("/")
            .body(Bytes::from(vec![b'x'; 16]))
            .unwrap();
        let err = run(BodyLimit::new(8), request).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_declared_length_over_limit() {
        let request = http::Request::post("/")
            .header(header::CONTENT_LENGTH, "3000000")
            .body(Bytes::new())
            .unwrap();
        let err = run(BodyLimit::default(), request).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_server_flagged_body() {
        let mut request = http::Request::post("/").body(Bytes::new()).unwrap();
        request.extensions_mut().insert(OversizedBody);
        assert!(run(BodyLimit::default(), request).await.is_err());
    }

    #[tokio::test]
    async fn test_unreadable_body_is_bad_request() {
        let mut request = http::Request::post("/").body(Bytes::new()).unwrap();
        request.extensions_mut().insert(UnreadableBody {
            reason: "invalid chunk size".to_string(),
        });
        let err = run(BodyLimit::default(), request).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.as_http().and_then(|e| e.message().as_text()),
            Some("failed to read request body")
        );
    }

    #[test]
    fn test_default_is_two_mebibytes() {
        assert_eq!(BodyLimit::default().limit(), 2_097_152);
    }
}
