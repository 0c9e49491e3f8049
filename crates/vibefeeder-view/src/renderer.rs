//! Rendering components into sinks and HTTP responses.

use std::any::Any;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use vibefeeder_core::{AppError, HttpError, RequestContext};

use crate::component::{Component, RenderError};
use crate::pool::BufferPool;

/// Response type produced by [`Renderer::html`].
pub type HtmlResponse = Response<Full<Bytes>>;

/// Renders components through pooled scratch buffers.
///
/// Output is accumulated in a buffer and written to the sink in a single
/// call after the component succeeds, so a failed render never leaves a
/// partial page behind. The buffer goes back to the pool on every path.
///
/// # Example
///
/// ```
/// use vibefeeder_core::RequestContext;
/// use vibefeeder_view::{pages::ErrorFragment, Renderer};
///
/// let renderer = Renderer::new();
/// let mut sink = Vec::new();
/// renderer
///     .render(&mut sink, "", &ErrorFragment::new("Oops"), &RequestContext::new())
///     .unwrap();
/// assert!(String::from_utf8(sink).unwrap().contains("Oops"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pool: Arc<BufferPool>,
}

impl Renderer {
    /// Creates a renderer with its own buffer pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a renderer sharing an existing pool.
    #[must_use]
    pub fn with_pool(pool: Arc<BufferPool>) -> Self {
        Self { pool }
    }

    /// Returns the buffer pool.
    #[must_use]
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Renders `component` and writes the result to `sink`.
    ///
    /// `_name` exists for callers that address templates by name; typed
    /// components make it redundant and it is ignored.
    pub fn render<W: io::Write + ?Sized>(
        &self,
        sink: &mut W,
        _name: &str,
        component: &dyn Component,
        ctx: &RequestContext,
    ) -> Result<(), AppError> {
        let mut buffer = self.pool.acquire();

        ctx.ensure_active()
            .map_err(RenderError::from)
            .map_err(render_failed)?;
        component.render(ctx, &mut buffer).map_err(render_failed)?;
        ctx.ensure_active()
            .map_err(RenderError::from)
            .map_err(render_failed)?;

        sink.write_all(&buffer)
            .map_err(|e| AppError::internal_with_source("failed to write rendered output", e))
    }

    /// Renders a type-erased payload, which must be a boxed or shared component.
    ///
    /// Any other payload yields a 500 transport error.
    pub fn render_any<W: io::Write + ?Sized>(
        &self,
        sink: &mut W,
        name: &str,
        data: &dyn Any,
        ctx: &RequestContext,
    ) -> Result<(), AppError> {
        if let Some(component) = data.downcast_ref::<Box<dyn Component>>() {
            return self.render(sink, name, &**component, ctx);
        }
        if let Some(component) = data.downcast_ref::<Arc<dyn Component>>() {
            return self.render(sink, name, &**component, ctx);
        }
        Err(HttpError::internal("data must be a Component").into())
    }

    /// Renders `component` into an HTML response with the given status.
    pub fn html(
        &self,
        status: StatusCode,
        component: &dyn Component,
        ctx: &RequestContext,
    ) -> Result<HtmlResponse, AppError> {
        let mut body = Vec::new();
        self.render(&mut body, "", component, ctx)?;
        Ok(Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Full::new(Bytes::from(body)))
            .expect("failed to build html response"))
    }
}

fn render_failed(err: RenderError) -> AppError {
    tracing::debug!(error = %err, "component render failed");
    AppError::internal_with_source("failed to render component", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::component_fn;
    use std::fmt::Write as _;
    use tokio_util::sync::CancellationToken;

    /// Sink that records every write call.
    #[derive(Default)]
    struct CountingSink {
        writes: usize,
        bytes: Vec<u8>,
    }

    impl io::Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn chunky() -> impl Component {
        component_fn(|_, out| {
            for i in 0..10 {
                write!(out, "<p>{i}</p>")?;
            }
            Ok(())
        })
    }

    #[test]
    fn test_success_writes_once() {
        let renderer = Renderer::new();
        let mut sink = CountingSink::default();
        renderer
            .render(&mut sink, "ignored", &chunky(), &RequestContext::new())
            .unwrap();
        assert_eq!(sink.writes, 1);
        assert!(sink.bytes.starts_with(b"<p>0</p>"));
        assert_eq!(renderer.pool().available(), 1);
    }

    #[test]
    fn test_failure_writes_nothing_and_releases_buffer() {
        let renderer = Renderer::new();
        let failing = component_fn(|_, out| {
            out.write_str("<p>partial")?;
            Err(RenderError::component("template exploded"))
        });

        let mut sink = CountingSink::default();
        let err = renderer
            .render(&mut sink, "", &failing, &RequestContext::new())
            .unwrap_err();

        assert_eq!(sink.writes, 0);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.as_http().is_none());
        assert_eq!(renderer.pool().available(), 1);
    }

    #[test]
    fn test_cancelled_context_writes_nothing() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());
        let cancelling = component_fn(move |_, out| {
            out.write_str("<p>")?;
            token.cancel();
            Ok(())
        });

        let mut sink = CountingSink::default();
        assert!(Renderer::new().render(&mut sink, "", &cancelling, &ctx).is_err());
        assert_eq!(sink.writes, 0);
    }

    #[test]
    fn test_render_any_requires_component() {
        let renderer = Renderer::new();
        let mut sink: Vec<u8> = Vec::new();

        let boxed: Box<dyn Component> = Box::new(chunky());
        renderer
            .render_any(&mut sink, "", &boxed, &RequestContext::new())
            .unwrap();
        assert!(!sink.is_empty());

        let err = renderer
            .render_any(&mut Vec::<u8>::new(), "", &"not a component", &RequestContext::new())
            .unwrap_err();
        let http = err.as_http().unwrap();
        assert_eq!(http.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(http.message().as_text(), Some("data must be a Component"));
    }

    #[test]
    fn test_html_response_headers() {
        let response = Renderer::new()
            .html(StatusCode::CREATED, &chunky(), &RequestContext::new())
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }
}
