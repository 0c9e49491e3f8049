//! Request routing.
//!
//! Routes are either exact (`GET /healthz`) or prefix routes
//! (`GET /static/`), checked in that order. A path that matches no route
//! produces a 404 error; a path that matches only under other methods
//! produces a 405. `HEAD` requests fall back to `GET` routes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use http::Method;
use vibefeeder_core::{HttpError, RequestContext};
use vibefeeder_middleware::{BoxFuture, MiddlewareContext, MiddlewareResult, Request};

/// A type-erased route handler.
pub type RouteHandler =
    Arc<dyn Fn(RequestContext, Request) -> BoxFuture<'static, MiddlewareResult> + Send + Sync>;

/// Method and path to handler.
///
/// # Example
///
/// ```rust
/// use http::{Method, StatusCode};
/// use vibefeeder_middleware::{Response, ResponseExt};
/// use vibefeeder_server::Router;
///
/// let router = Router::new()
///     .get("/", |_ctx, _req| async { Ok(Response::text(StatusCode::OK, "home")) })
///     .prefix(Method::GET, "/static/", |_ctx, _req| async {
///         Ok(Response::text(StatusCode::OK, "asset"))
///     });
///
/// assert!(router.has_route(&Method::GET, "/"));
/// assert!(router.has_route(&Method::GET, "/static/css/app.css"));
/// assert!(!router.has_route(&Method::POST, "/"));
/// ```
#[derive(Clone, Default)]
pub struct Router {
    exact: HashMap<String, Vec<(Method, RouteHandler)>>,
    prefixes: Vec<(String, Method, RouteHandler)>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("exact", &self.exact.keys().collect::<Vec<_>>())
            .field(
                "prefixes",
                &self.prefixes.iter().map(|(p, m, _)| (p, m)).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn erase<F, Fut>(handler: F) -> RouteHandler
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MiddlewareResult> + Send + 'static,
{
    Arc::new(move |ctx, request| Box::pin(handler(ctx, request)))
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exact route. A later route for the same method and path
    /// replaces the earlier one.
    #[must_use]
    pub fn route<F, Fut>(mut self, method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        let handlers = self.exact.entry(path.into()).or_default();
        handlers.retain(|(m, _)| *m != method);
        handlers.push((method, erase(handler)));
        self
    }

    /// Adds an exact `GET` route.
    #[must_use]
    pub fn get<F, Fut>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    /// Adds an exact `POST` route.
    #[must_use]
    pub fn post<F, Fut>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    /// Adds a route matching every path that starts with `prefix`.
    #[must_use]
    pub fn prefix<F, Fut>(mut self, method: Method, prefix: impl Into<String>, handler: F) -> Self
    where
        F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        self.prefixes.push((prefix.into(), method, erase(handler)));
        self
    }

    /// Returns `true` if a handler would run for `method` and `path`.
    #[must_use]
    pub fn has_route(&self, method: &Method, path: &str) -> bool {
        matches!(self.lookup(method, path), Lookup::Found(_))
    }

    /// Runs the handler for the request, or fails with 404 or 405.
    ///
    /// The handler receives the request context snapshot taken from `ctx`
    /// at dispatch time.
    pub fn dispatch(&self, ctx: &MiddlewareContext, request: Request) -> BoxFuture<'static, MiddlewareResult> {
        match self.lookup(request.method(), request.uri().path()) {
            Lookup::Found(handler) => handler(ctx.to_request_context(), request),
            Lookup::MethodNotAllowed => {
                let method = request.method().clone();
                Box::pin(async move {
                    Err(HttpError::method_not_allowed(format!("method {method} not allowed")).into())
                })
            }
            Lookup::NotFound => {
                let path = request.uri().path().to_string();
                Box::pin(async move { Err(HttpError::not_found(format!("no route for {path}")).into()) })
            }
        }
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let exact = self
            .exact
            .get(path)
            .into_iter()
            .flatten()
            .map(|(m, h)| (m, h));
        let prefixed = self
            .prefixes
            .iter()
            .filter(|(prefix, _, _)| path.starts_with(prefix.as_str()))
            .map(|(_, m, h)| (m, h));
        let candidates: Vec<(&Method, &RouteHandler)> = exact.chain(prefixed).collect();

        if candidates.is_empty() {
            return Lookup::NotFound;
        }

        let with_method = |wanted: &Method| {
            candidates
                .iter()
                .find(|(m, _)| *m == wanted)
                .map(|(_, h)| Arc::clone(h))
        };
        let found = with_method(method).or_else(|| {
            if *method == Method::HEAD {
                with_method(&Method::GET)
            } else {
                None
            }
        });

        found.map_or(Lookup::MethodNotAllowed, Lookup::Found)
    }
}

enum Lookup {
    Found(RouteHandler),
    MethodNotAllowed,
    NotFound,
}
