//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline.
//! It is separate from [`RequestContext`] so stages can mutate it freely
//! before the immutable snapshot is handed to the handler and renderer.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue};
use tokio_util::sync::CancellationToken;
use vibefeeder_core::{with_csrf_token, RequestContext, RequestId};

use crate::types::Response;

/// The CSRF token issued for the current request.
///
/// Set by the CSRF stage both here and in the request's extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use vibefeeder_core::csrf_token;
/// use vibefeeder_middleware::context::{CsrfToken, MiddlewareContext};
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_extension(CsrfToken("abc".to_string()));
///
/// let request_ctx = ctx.to_request_context();
/// assert_eq!(csrf_token(&request_ctx), "abc");
/// assert_eq!(request_ctx.request_id(), ctx.request_id());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    remote_addr: Option<SocketAddr>,
    started_at: Instant,
    cancellation: CancellationToken,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    response_headers: HeaderMap,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            remote_addr: None,
            started_at: Instant::now(),
            cancellation: CancellationToken::new(),
            extensions: HashMap::new(),
            response_headers: HeaderMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the peer address of the connection, if known.
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Sets the peer address of the connection.
    pub fn set_remote_addr(&mut self, addr: SocketAddr) {
        self.remote_addr = Some(addr);
    }

    /// Returns the token cancelled when the client goes away or the server
    /// shuts down.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Replaces the cancellation token.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancellation = token;
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Queues a header for the final response.
    ///
    /// Queued headers reach every response, including error responses built
    /// after a downstream failure. A header the handler already set is kept,
    /// except `Set-Cookie`, which is appended.
    pub fn add_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        if name == header::SET_COOKIE {
            self.response_headers.append(name, value);
        } else {
            self.response_headers.insert(name, value);
        }
    }

    /// Returns the headers queued so far.
    #[must_use]
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Moves the queued headers onto `response`.
    ///
    /// Draining makes a second call a no-op.
    pub fn apply_response_headers(&mut self, response: &mut Response) {
        let queued = std::mem::take(&mut self.response_headers);
        let headers = response.headers_mut();
        let mut last_name = None;
        for (name, value) in queued {
            let name = match name {
                Some(name) => {
                    last_name = Some(name.clone());
                    name
                }
                None => match &last_name {
                    Some(name) => name.clone(),
                    None => continue,
                },
            };
            if name == header::SET_COOKIE {
                headers.append(name, value);
            } else if !headers.contains_key(&name) {
                headers.insert(name, value);
            }
        }
    }

    /// Snapshot handed to handlers and components.
    ///
    /// Carries the request ID, the cancellation token and, when issued, the
    /// CSRF token.
    #[must_use]
    pub fn to_request_context(&self) -> RequestContext {
        let ctx = RequestContext::with_request_id(self.request_id)
            .with_cancellation(self.cancellation.clone());

        match self.get_extension::<CsrfToken>() {
            Some(CsrfToken(token)) => with_csrf_token(&ctx, token.clone()),
            None => ctx,
        }
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use vibefeeder_core::csrf_token;

    fn empty_response() -> Response {
        http::Response::new(Full::new(Bytes::new()))
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Marker(u8);

        let mut ctx = MiddlewareContext::new();
        assert!(ctx.get_extension::<Marker>().is_none());

        ctx.set_extension(Marker(7));
        assert_eq!(ctx.get_extension::<Marker>(), Some(&Marker(7)));
        assert_eq!(ctx.remove_extension::<Marker>(), Some(Marker(7)));
        assert!(ctx.get_extension::<Marker>().is_none());
    }

    #[test]
    fn test_response_headers_do_not_override_handler() {
        let mut ctx = MiddlewareContext::new();
        ctx.add_response_header(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        ctx.add_response_header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let mut response = empty_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("public"));
        ctx.apply_response_headers(&mut response);

        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public");
    }

    #[test]
    fn test_set_cookie_is_appended_once() {
        let mut ctx = MiddlewareContext::new();
        ctx.add_response_header(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        ctx.add_response_header(header::SET_COOKIE, HeaderValue::from_static("b=2"));

        let mut response = empty_response();
        response
            .headers_mut()
            .insert(header::SET_COOKIE, HeaderValue::from_static("session=x"));
        ctx.apply_response_headers(&mut response);
        ctx.apply_response_headers(&mut response);

        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 3);
    }

    #[test]
    fn test_to_request_context_without_csrf() {
        let ctx = MiddlewareContext::new();
        let request_ctx = ctx.to_request_context();
        assert_eq!(csrf_token(&request_ctx), "");
        assert!(!request_ctx.is_cancelled());
    }

    #[test]
    fn test_cancellation_propagates() {
        let mut ctx = MiddlewareContext::new();
        let token = CancellationToken::new();
        ctx.set_cancellation_token(token.clone());
        let request_ctx = ctx.to_request_context();
        token.cancel();
        assert!(request_ctx.is_cancelled());
    }

    #[test]
    fn test_remote_addr() {
        let mut ctx = MiddlewareContext::new();
        assert!(ctx.remote_addr().is_none());
        ctx.set_remote_addr("10.0.0.1:4000".parse().unwrap());
        assert_eq!(ctx.remote_addr().unwrap().port(), 4000);
    }
}
