//! Panic recovery.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use vibefeeder_core::AppError;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{MiddlewareResult, Request};

/// Converts a panic anywhere downstream into a 500 error.
///
/// The panic payload is logged; the client only sees the generic message
/// produced by the error handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recover;

impl Middleware for Recover {
    fn name(&self) -> &'static str {
        "recover"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            let request_id = ctx.request_id();
            match AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(request_id = %request_id, panic = %message, "Handler panicked");
                    Err(AppError::internal(format!("handler panicked: {message}")))
                }
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Response, ResponseExt};
    use bytes::Bytes;
    use http::StatusCode;

    fn request() -> Request {
        http::Request::get("/").body(Bytes::new()).unwrap()
    }

    async fn explode() -> MiddlewareResult {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|_ctx, _req| Box::pin(explode()));

        let err = Recover.process(&mut ctx, request(), next).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.as_http().is_none());
        assert!(err.to_string().contains("handler exploded"));
    }

    #[tokio::test]
    async fn test_passes_through_normal_responses() {
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async { Ok(Response::text(StatusCode::ACCEPTED, "ok")) })
        });

        let response = Recover.process(&mut ctx, request(), next).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic");
    }
}
