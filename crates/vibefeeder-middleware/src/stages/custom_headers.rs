//! Deployment-specific response headers.

use http::{HeaderName, HeaderValue};

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{MiddlewareResult, Request};

/// Adds a configured list of headers to every response.
///
/// The default list holds the `Permissions-Policy` that disables
/// geolocation, microphone and camera access.
#[derive(Debug, Clone)]
pub struct CustomHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl CustomHeaders {
    /// Creates the stage with `headers`.
    #[must_use]
    pub fn new(headers: Vec<(HeaderName, HeaderValue)>) -> Self {
        Self { headers }
    }

    /// Adds one header.
    #[must_use]
    pub fn with(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Consumes the stage, returning its header list.
    #[must_use]
    pub fn into_headers(self) -> Vec<(HeaderName, HeaderValue)> {
        self.headers
    }
}

impl Default for CustomHeaders {
    fn default() -> Self {
        Self::new(vec![(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
        )])
    }
}

impl Middleware for CustomHeaders {
    fn name(&self) -> &'static str {
        "custom_headers"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            for (name, value) in &self.headers {
                ctx.add_response_header(name.clone(), value.clone());
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

    #[tokio::test]
    async fn test_default_and_extra_headers() {
        let stage = CustomHeaders::default().with(
            HeaderName::from_static("x-robots-tag"),
            HeaderValue::from_static("noindex"),
        );
        let mut ctx = MiddlewareContext::new();
        let request = http::Request::get("/").body(Bytes::new()).unwrap();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async { Ok(Response::text(StatusCode::OK, "ok")) })
        });

        let mut response = stage.process(&mut ctx, request, next).await.unwrap();
        ctx.apply_response_headers(&mut response);

        assert_eq!(
            response.headers()["permissions-policy"],
            "geolocation=(), microphone=(), camera=()"
        );
        assert_eq!(response.headers()["x-robots-tag"], "noindex");
    }

    #[tokio::test]
    async fn test_handler_header_wins() {
        let mut ctx = MiddlewareContext::new();
        let request = http::Request::get("/").body(Bytes::new()).unwrap();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async {
                let mut response = Response::text(StatusCode::OK, "ok");
                response.headers_mut().insert(
                    "permissions-policy",
                    HeaderValue::from_static("camera=(self)"),
                );
                Ok(response)
            })
        });

        let mut response = CustomHeaders::default()
            .process(&mut ctx, request, next)
            .await
            .unwrap();
        ctx.apply_response_headers(&mut response);
        assert_eq!(response.headers()["permissions-policy"], "camera=(self)");
    }
}
