//! The extraction trait.

use bytes::Bytes;
use http::Request;

/// Builds a value from a buffered request.
pub trait FromRequest: Sized {
    /// Error returned when extraction fails.
    type Rejection;

    /// Extracts `Self` from `request`.
    ///
    /// # Errors
    ///
    /// Returns the rejection when the request does not carry a valid value.
    fn from_request(request: &Request<Bytes>) -> Result<Self, Self::Rejection>;
}
