//! Query string extraction.

use std::ops::Deref;

use bytes::Bytes;
use http::{Request, Uri};
use serde::de::DeserializeOwned;

use crate::error::ExtractError;
use crate::extractor::FromRequest;

/// Extractor for the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T>(pub T);

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Query<T> {
    type Rejection = ExtractError;

    fn from_request(request: &Request<Bytes>) -> Result<Self, Self::Rejection> {
        serde_urlencoded::from_str(request.uri().query().unwrap_or_default())
            .map(Query)
            .map_err(|source| ExtractError::Decode {
                source_name: "query",
                source,
            })
    }
}

/// Looks up a single query parameter. The first occurrence wins.
#[must_use]
pub fn query_value(uri: &Uri, name: &str) -> Option<String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(uri.query()?)
        .ok()?
        .into_iter()
        .find_map(|(key, value)| (key == name).then_some(value))
}
