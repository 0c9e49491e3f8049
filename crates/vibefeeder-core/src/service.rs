//! Structured business-logic errors.

use http::StatusCode;
use thiserror::Error;

use crate::error::{AppError, HttpError};
use crate::field_errors::FieldErrors;

/// An error raised by service code, carrying the status it should map to.
///
/// Field errors, when present, reach the client through the field-error map;
/// the cause is only ever logged.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use vibefeeder_core::{parse_field_errors, AppError, ServiceError};
///
/// let err = ServiceError::new(StatusCode::CONFLICT, "Could not register")
///     .add_field_error("email", "already taken");
/// let app: AppError = err.into();
///
/// assert_eq!(app.status_code(), StatusCode::CONFLICT);
/// assert_eq!(parse_field_errors(&app).unwrap().get("email"), Some("already taken"));
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ServiceError {
    code: StatusCode,
    message: String,
    field_errors: FieldErrors,
    #[source]
    cause: Option<anyhow::Error>,
}

impl ServiceError {
    /// Creates an error with a status and user-facing message.
    #[must_use]
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field_errors: FieldErrors::new(),
            cause: None,
        }
    }

    /// Creates an error with field-level messages.
    #[must_use]
    pub fn with_fields(code: StatusCode, message: impl Into<String>, fields: FieldErrors) -> Self {
        Self {
            field_errors: fields,
            ..Self::new(code, message)
        }
    }

    /// Creates an error with an underlying cause kept for logging.
    pub fn with_cause(
        code: StatusCode,
        message: impl Into<String>,
        cause: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            cause: Some(cause.into()),
            ..Self::new(code, message)
        }
    }

    /// Adds or replaces a field-level message.
    #[must_use]
    pub fn add_field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.field_errors.insert(field, message);
        self
    }

    /// Returns `true` if any field-level messages are present.
    #[must_use]
    pub fn has_field_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }

    /// Returns the status code.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns the user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field-level messages.
    #[must_use]
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        let http = if err.field_errors.is_empty() {
            HttpError::new(err.code, err.message)
        } else {
            HttpError::with_fields(err.code, err.field_errors)
        };
        match err.cause {
            Some(cause) => http.with_source(cause),
            None => http,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Http(err.into())
    }
}
