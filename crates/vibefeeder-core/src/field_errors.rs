//! Field-error map and the strict parser that extracts it from an error.

use std::collections::hash_map;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorMessage};

/// Field name to user-facing message, one entry per failed field.
///
/// Keys are case-sensitive field identifiers. An empty map is a valid value
/// and distinct from "no validation failure".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    /// Creates a new empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message for a field, replacing any previous one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Records a message only if the field has none yet.
    ///
    /// Returns `true` when the message was recorded.
    pub fn insert_first(&mut self, field: impl Into<String>, message: impl Into<String>) -> bool {
        match self.0.entry(field.into()) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(message.into());
                true
            }
        }
    }

    /// Returns the message for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns `true` if the field has a message.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterates over field names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(field, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

impl From<HashMap<String, String>> for FieldErrors {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Extracts the field-error map from an error.
///
/// Yields the map only when `err` is itself a transport error whose message
/// is a field-error map. Aggregated errors are not searched, and transport
/// errors carrying text or other payloads yield `None`. The returned
/// reference points at the map stored inside `err`.
///
/// # Example
///
/// ```
/// use vibefeeder_core::{parse_field_errors, AppError, FieldErrors, HttpError};
///
/// let fields: FieldErrors = [("email", "invalid email format")].into_iter().collect();
/// let err: AppError = HttpError::with_fields(http::StatusCode::BAD_REQUEST, fields).into();
/// assert_eq!(parse_field_errors(&err).unwrap().get("email"), Some("invalid email format"));
///
/// let text: AppError = HttpError::bad_request("bad request").into();
/// assert!(parse_field_errors(&text).is_none());
/// ```
#[must_use]
pub fn parse_field_errors(err: &AppError) -> Option<&FieldErrors> {
    match err {
        AppError::Http(http) => match http.message() {
            ErrorMessage::Fields(fields) => Some(fields),
            ErrorMessage::Text(_) | ErrorMessage::Opaque(_) => None,
        },
        AppError::Joined(_) | AppError::Internal { .. } => None,
    }
}
