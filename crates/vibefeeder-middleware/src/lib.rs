//! # VibeFeeder Middleware
//!
//! The request pipeline every request flows through, its stages, and the
//! error handler that turns failures into responses.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → Logger → Recover → BodyLimit → SecurityHeaders → CustomHeaders → Csrf → Handler
//!                                                                                     ↓
//! Response ← Logger (error handler, log entry) ←─────────────────────────────────────┘
//! ```
//!
//! | Stage | Middleware        | Purpose                                       |
//! |-------|-------------------|-----------------------------------------------|
//! | 1     | Request logger    | Finalize errors, one log entry per request    |
//! | 2     | Recover           | Handler panic to 500                          |
//! | 3     | Body limit        | 413 for bodies over the limit (2 MiB)         |
//! | 4     | Security headers  | XSS, sniffing, framing, CSP, referrer headers |
//! | 5     | Custom headers    | `Permissions-Policy` and deployment headers   |
//! | 6     | CSRF              | Double-submit token cookie and check          |
//!
//! Stages queue response headers on the [`MiddlewareContext`]; they are
//! applied after error handling so error pages carry them too.
//!
//! ## Example
//!
//! ```
//! use vibefeeder_middleware::pipeline::{Pipeline, PipelineConfig, Stage};
//!
//! let pipeline = Pipeline::standard(PipelineConfig::default());
//! assert_eq!(pipeline.stage_count(), Stage::all().len());
//! assert_eq!(pipeline.stage_names()[0], "request_logger");
//! ```

#![doc(html_root_url = "https://docs.rs/vibefeeder-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error_handler;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::{CsrfToken, MiddlewareContext};
pub use error_handler::{wants_html, ErrorDescription, ErrorHandler};
pub use middleware::{BoxFuture, HandlerFn, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder, PipelineConfig, Stage};
pub use stages::{RequestLogRecord, CSRF_COOKIE, CSRF_FIELD, CSRF_HEADER, DEFAULT_BODY_LIMIT};
pub use types::{MiddlewareResult, OversizedBody, Request, Response, ResponseExt, UnreadableBody};
