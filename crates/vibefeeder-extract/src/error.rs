//! Extraction error types.

use http::StatusCode;
use thiserror::Error;
use vibefeeder_core::{AppError, HttpError};

/// Error raised when a request cannot be decoded.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A header value is not visible ASCII.
    #[error("invalid {0} header")]
    InvalidHeader(&'static str),

    /// The body is not `application/x-www-form-urlencoded`.
    #[error("expected an application/x-www-form-urlencoded body")]
    UnsupportedMediaType,

    /// The form or query could not be decoded into the target type.
    #[error("failed to decode {source_name}: {source}")]
    Decode {
        /// `form` or `query`.
        source_name: &'static str,
        /// The decoder error.
        #[source]
        source: serde_urlencoded::de::Error,
    },
}

impl ExtractError {
    /// HTTP status reported for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidHeader(_) | Self::Decode { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ExtractError> for HttpError {
    fn from(err: ExtractError) -> Self {
        HttpError::new(err.status_code(), err.to_string())
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        HttpError::from(err).into()
    }
}
