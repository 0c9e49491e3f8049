//! Test request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;
use vibefeeder_middleware::Request;

use crate::error::TestError;

/// Builder for an in-process request.
///
/// Invalid header names, values or bodies are recorded and reported by
/// [`build`](Self::build) rather than panicking at the call site.
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Sets a header, replacing any earlier value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.fail(TestError::RequestBuild(format!("invalid header name: {e}"))),
            (_, Err(e)) => self.fail(TestError::RequestBuild(format!("invalid header value: {e}"))),
        }
        self
    }

    /// Sets the `Accept` header.
    pub fn accept(self, accept: impl AsRef<str>) -> Self {
        self.header(header::ACCEPT.as_str(), accept)
    }

    /// Marks the request as coming from HTMX.
    pub fn htmx(self) -> Self {
        self.header("HX-Request", "true")
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.fail(e.into()),
        }
        self.header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    /// Sets an urlencoded form body and its `Content-Type`.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Bytes::from(encoded),
            Err(e) => self.fail(e.into()),
        }
        self.header(
            header::CONTENT_TYPE.as_str(),
            "application/x-www-form-urlencoded",
        )
    }

    fn fail(&mut self, err: TestError) {
        self.error.get_or_insert(err);
    }

    pub(crate) fn has_header(&self, name: &HeaderName) -> bool {
        self.headers.contains_key(name)
    }

    /// Builds the request.
    pub fn build(self) -> Result<Request, TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI: {e}")))?;

        let mut request = http::Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_body() {
        let request = TestRequestBuilder::new(Method::POST, "/login")
            .form(&[("email", "a@b.c"), ("note", "x y")])
            .build()
            .unwrap();

        assert_eq!(
            request.headers()[header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(&request.body()[..], b"email=a%40b.c&note=x+y");
    }

    #[test]
    fn test_json_body() {
        let request = TestRequestBuilder::new(Method::POST, "/api")
            .json(&serde_json::json!({"name": "Alice"}))
            .build()
            .unwrap();
        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(&request.body()[..], br#"{"name":"Alice"}"#);
    }

    #[test]
    fn test_invalid_header_is_reported_on_build() {
        let err = TestRequestBuilder::new(Method::GET, "/")
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }

    #[test]
    fn test_htmx_and_accept() {
        let request = TestRequestBuilder::new(Method::GET, "/")
            .htmx()
            .accept("text/html")
            .build()
            .unwrap();
        assert_eq!(request.headers()["hx-request"], "true");
        assert_eq!(request.headers()[header::ACCEPT], "text/html");
    }
}
