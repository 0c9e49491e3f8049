//! Fixed-order middleware pipeline.
//!
//! The standard pipeline runs these stages in order:
//!
//! 1. **Request logger** - one structured log entry per request
//! 2. **Recover** - turns handler panics into 500 errors
//! 3. **Body limit** - rejects oversized bodies with 413
//! 4. **Security headers** - XSS, framing, sniffing and CSP headers
//! 5. **Custom headers** - deployment-specific headers
//! 6. **CSRF** - issues and checks the double-submit token (optional)
//!
//! Errors that escape every stage are converted by the [`ErrorHandler`], and
//! headers queued by the stages are applied to whatever response results.

use std::sync::Arc;

use http::{HeaderName, HeaderValue};

use crate::context::MiddlewareContext;
use crate::error_handler::ErrorHandler;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{
    BodyLimit, CsrfProtection, CustomHeaders, Recover, RequestLogger, SecurityHeaders,
    DEFAULT_BODY_LIMIT,
};
use crate::types::{MiddlewareResult, Request, Response};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Settings for [`Pipeline::standard`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// Whether the CSRF stage runs.
    pub csrf: bool,
    /// Whether the CSRF cookie carries the `Secure` flag.
    pub secure_cookies: bool,
    /// Headers added by the custom headers stage.
    pub custom_headers: Vec<(HeaderName, HeaderValue)>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
            csrf: true,
            secure_cookies: false,
            custom_headers: CustomHeaders::default().into_headers(),
        }
    }
}

/// The middleware pipeline every request flows through.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::StatusCode;
/// use vibefeeder_middleware::{MiddlewareContext, Pipeline, PipelineConfig, Response, ResponseExt};
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::standard(PipelineConfig::default());
/// let request = http::Request::get("/").body(Bytes::new()).unwrap();
///
/// let response = pipeline
///     .process(MiddlewareContext::new(), request, |_ctx, _req| {
///         Box::pin(async { Ok(Response::text(StatusCode::OK, "hello")) })
///     })
///     .await;
///
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.headers()["x-frame-options"], "DENY");
/// # });
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    error_handler: Arc<ErrorHandler>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates the standard pipeline with a default error handler.
    #[must_use]
    pub fn standard(config: PipelineConfig) -> Self {
        Self::standard_with_handler(config, Arc::new(ErrorHandler::default()))
    }

    /// Creates the standard pipeline around `error_handler`.
    #[must_use]
    pub fn standard_with_handler(config: PipelineConfig, error_handler: Arc<ErrorHandler>) -> Self {
        let mut builder = Self::builder()
            .error_handler(Arc::clone(&error_handler))
            .add_stage(RequestLogger::new(error_handler))
            .add_stage(Recover)
            .add_stage(BodyLimit::new(config.body_limit))
            .add_stage(SecurityHeaders::default())
            .add_stage(CustomHeaders::new(config.custom_headers));

        if config.csrf {
            builder = builder.add_stage(CsrfProtection::new(config.secure_cookies));
        }

        builder.build()
    }

    /// Processes a request through every stage and then `handler`.
    ///
    /// Always produces a response: an error escaping the chain is converted
    /// by the error handler, and headers queued on the context are applied.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, MiddlewareResult>
            + Send
            + 'static,
    {
        let headers = request.headers().clone();
        let result = self.build_chain(handler).run(&mut ctx, request).await;
        let (response, _) = self.error_handler.finalize(&mut ctx, &headers, result);
        response
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, MiddlewareResult> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the error handler.
    #[must_use]
    pub fn error_handler(&self) -> &ErrorHandler {
        &self.error_handler
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
    error_handler: Option<Arc<ErrorHandler>>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            error_handler: None,
        }
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn add_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Sets the handler for errors escaping the chain.
    #[must_use]
    pub fn error_handler(mut self, handler: Arc<ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
            error_handler: self.error_handler.unwrap_or_default(),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The stages of the standard pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Structured request logging.
    RequestLogger = 1,
    /// Panic recovery.
    Recover = 2,
    /// Request body size limit.
    BodyLimit = 3,
    /// Response hardening headers.
    SecurityHeaders = 4,
    /// Configured extra headers.
    CustomHeaders = 5,
    /// CSRF token issue and check.
    Csrf = 6,
}

impl Stage {
    /// Returns the stage name, as reported by [`Middleware::name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestLogger => "request_logger",
            Self::Recover => "recover",
            Self::BodyLimit => "body_limit",
            Self::SecurityHeaders => "security_headers",
            Self::CustomHeaders => "custom_headers",
            Self::Csrf => "csrf",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 6] {
        [
            Self::RequestLogger,
            Self::Recover,
            Self::BodyLimit,
            Self::SecurityHeaders,
            Self::CustomHeaders,
            Self::Csrf,
        ]
    }
}
