//! URL-encoded form bodies.

use std::ops::Deref;

use bytes::Bytes;
use http::{header, HeaderMap, Request};
use serde::de::DeserializeOwned;
use vibefeeder_core::AppError;
use vibefeeder_validate::{Validate, Validator};

use crate::error::ExtractError;
use crate::extractor::FromRequest;

/// Extractor for `application/x-www-form-urlencoded` bodies.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use http::{header, Request};
/// use serde::Deserialize;
/// use vibefeeder_extract::{Form, FromRequest};
///
/// #[derive(Deserialize)]
/// struct Search {
///     query: String,
/// }
///
/// let request = Request::post("/search")
///     .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
///     .body(Bytes::from_static(b"query=hello+world"))
///     .unwrap();
///
/// let Form(search) = Form::<Search>::from_request(&request).unwrap();
/// assert_eq!(search.query, "hello world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form<T>(pub T);

impl<T> Form<T> {
    /// Consumes the Form and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Form<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Form<T> {
    type Rejection = ExtractError;

    fn from_request(request: &Request<Bytes>) -> Result<Self, Self::Rejection> {
        if !is_form(request.headers()) {
            return Err(ExtractError::UnsupportedMediaType);
        }

        serde_urlencoded::from_bytes(request.body())
            .map(Form)
            .map_err(|source| ExtractError::Decode {
                source_name: "form",
                source,
            })
    }
}

/// Decodes a form and validates it.
///
/// Rejections are returned as [`AppError`]s ready for the error handler:
/// a decode failure is a plain 400, a validation failure is a 400 carrying
/// the field-error map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm<T>(pub T);

impl<T> ValidatedForm<T>
where
    T: DeserializeOwned + Validate,
{
    /// Decodes the body of `request` and runs `validator` over the result.
    ///
    /// # Errors
    ///
    /// Returns an [`AppError`] wrapping either the [`ExtractError`] or the
    /// validation failure.
    pub fn extract(request: &Request<Bytes>, validator: &Validator) -> Result<Self, AppError> {
        let Form(value) = Form::<T>::from_request(request)?;
        validator.validate(&value)?;
        Ok(Self(value))
    }
}

impl<T> ValidatedForm<T> {
    /// Consumes the wrapper and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Returns `true` if the request declares a URL-encoded form body.
#[must_use]
pub fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}

/// Looks up a single field of a URL-encoded body.
///
/// Returns `None` when the request is not a form, the body does not decode,
/// or the field is absent. The first occurrence wins.
#[must_use]
pub fn form_value(headers: &HeaderMap, body: &[u8], name: &str) -> Option<String> {
    if !is_form(headers) {
        return None;
    }
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .ok()?
        .into_iter()
        .find_map(|(key, value)| (key == name).then_some(value))
}
