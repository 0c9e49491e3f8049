//! Middleware stages of the standard pipeline.
//!
//! 1. [`request_logger`] - structured log entry per request
//! 2. [`recover`] - panic recovery
//! 3. [`body_limit`] - request body size limit
//! 4. [`security_headers`] - response hardening
//! 5. [`custom_headers`] - deployment headers
//! 6. [`csrf`] - double-submit CSRF protection

pub mod body_limit;
pub mod csrf;
pub mod custom_headers;
pub mod recover;
pub mod request_logger;
pub mod security_headers;

pub use body_limit::{BodyLimit, DEFAULT_BODY_LIMIT};
pub use csrf::{CsrfProtection, CSRF_COOKIE, CSRF_FIELD, CSRF_HEADER};
pub use custom_headers::CustomHeaders;
pub use recover::Recover;
pub use request_logger::{remote_ip, RequestLogRecord, RequestLogger};
pub use security_headers::SecurityHeaders;
