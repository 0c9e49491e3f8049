//! # Vibefeeder Core
//!
//! Foundational types shared by every vibefeeder crate:
//!
//! - [`HttpError`] / [`AppError`] - the transport error and the error every
//!   handler and middleware returns
//! - [`FieldErrors`] - field name to message map produced by validation
//! - [`parse_field_errors`] - strict extraction of a field map from an error
//! - [`RequestContext`] - immutable per-request value snapshot with cancellation
//! - [`csrf_token`] / [`with_csrf_token`] - the template-facing CSRF slot

#![doc(html_root_url = "https://docs.rs/vibefeeder-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod csrf;
mod error;
mod field_errors;
mod service;

pub use context::{Cancelled, RequestContext, RequestId};
pub use csrf::{csrf_token, with_csrf_token};
pub use error::{AppError, AppResult, ErrorCategory, ErrorMessage, HttpError};
pub use field_errors::{parse_field_errors, FieldErrors};
pub use service::ServiceError;
