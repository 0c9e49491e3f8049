//! Error types for vibefeeder.
//!
//! Two layers exist:
//!
//! - [`HttpError`] is the transport error: a status code plus a message
//!   slot. The slot is a tagged union so a [`FieldErrors`] map can travel
//!   from the validator to the error handler without being flattened.
//! - [`AppError`] is what handlers and middleware return. It wraps transport
//!   errors, internal failures, and aggregates of several errors.
//!
//! The global error handler is the only place that turns an [`AppError`]
//! into a response body.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field_errors::FieldErrors;

/// Result type alias using [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Coarse classification of an error, derived from its status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Input failed validation (400).
    Validation,
    /// Authentication or CSRF rejection (401, 403).
    Authorization,
    /// Resource or route not found (404).
    NotFound,
    /// Request body exceeded the configured limit (413).
    PayloadTooLarge,
    /// Any other 4xx.
    Client,
    /// A dependency is unavailable (503).
    Unavailable,
    /// Internal server error (every other 5xx and non-transport errors).
    Internal,
}

impl ErrorCategory {
    /// Classifies a status code.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::Validation,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Authorization,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge,
            StatusCode::SERVICE_UNAVAILABLE => Self::Unavailable,
            s if s.is_client_error() => Self::Client,
            _ => Self::Internal,
        }
    }
}

/// Payload carried in the message slot of an [`HttpError`].
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorMessage {
    /// Plain text message.
    Text(String),
    /// Per-field validation messages.
    Fields(FieldErrors),
    /// Any other structured payload.
    Opaque(serde_json::Value),
}

impl ErrorMessage {
    /// Returns the text when this is a [`ErrorMessage::Text`] payload.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the field map when this is a [`ErrorMessage::Fields`] payload.
    #[must_use]
    pub fn as_fields(&self) -> Option<&FieldErrors> {
        match self {
            Self::Fields(fields) => Some(fields),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Fields(fields) => {
                let mut names: Vec<&str> = fields.keys().collect();
                names.sort_unstable();
                write!(f, "invalid fields: {}", names.join(", "))
            }
            Self::Opaque(value) => write!(f, "{value}"),
        }
    }
}

impl From<String> for ErrorMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ErrorMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<FieldErrors> for ErrorMessage {
    fn from(fields: FieldErrors) -> Self {
        Self::Fields(fields)
    }
}

impl From<serde_json::Value> for ErrorMessage {
    fn from(value: serde_json::Value) -> Self {
        Self::Opaque(value)
    }
}

/// Transport-level error: a status code and a message payload.
///
/// # Example
///
/// ```
/// use vibefeeder_core::{FieldErrors, HttpError};
///
/// let mut fields = FieldErrors::new();
/// fields.insert("email", "Must be a valid email address");
///
/// let err = HttpError::with_fields(http::StatusCode::BAD_REQUEST, fields);
/// assert_eq!(err.status().as_u16(), 400);
/// assert!(err.message().as_fields().is_some());
/// ```
#[derive(Debug, Error)]
#[error("code={}, message={}", .status.as_u16(), .message)]
pub struct HttpError {
    status: StatusCode,
    message: ErrorMessage,
    #[source]
    source: Option<anyhow::Error>,
}

impl HttpError {
    /// Creates a transport error with an arbitrary payload.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<ErrorMessage>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error whose payload is a field-error map.
    #[must_use]
    pub fn with_fields(status: StatusCode, fields: FieldErrors) -> Self {
        Self::new(status, ErrorMessage::Fields(fields))
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<ErrorMessage>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<ErrorMessage>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(message: impl Into<ErrorMessage>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 405 Method Not Allowed.
    #[must_use]
    pub fn method_not_allowed(message: impl Into<ErrorMessage>) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, message)
    }

    /// 413 Payload Too Large.
    #[must_use]
    pub fn payload_too_large(message: impl Into<ErrorMessage>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<ErrorMessage>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 503 Service Unavailable.
    #[must_use]
    pub fn service_unavailable(message: impl Into<ErrorMessage>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// Attaches an underlying cause. It is logged, never sent to clients.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the message payload.
    #[must_use]
    pub const fn message(&self) -> &ErrorMessage {
        &self.message
    }

    /// Returns the error category for the status code.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_status(self.status)
    }
}

/// The error type returned by handlers and middleware.
#[derive(Debug, Error)]
pub enum AppError {
    /// A transport error. Its status and message are respected.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Several errors aggregated together.
    #[error("{}", joined_display(.0))]
    Joined(Vec<AppError>),

    /// Anything else. Always surfaces as a 500 with a generic message.
    #[error("Internal error: {message}")]
    Internal {
        /// Description for logs.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

fn joined_display(errors: &[AppError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Aggregates several errors.
    pub fn join(errors: impl IntoIterator<Item = AppError>) -> Self {
        Self::Joined(errors.into_iter().collect())
    }

    /// Returns the transport error when this is one, without unwrapping aggregates.
    #[must_use]
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status code this error resolves to.
    ///
    /// Only direct transport errors keep their status; everything else is 500.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.as_http()
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, HttpError::status)
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_status(self.status_code())
    }
}
