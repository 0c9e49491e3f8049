//! The component contract.

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use vibefeeder_core::{Cancelled, RequestContext};

/// Errors raised while rendering a component.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The request was cancelled before rendering finished.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// Writing into the buffer failed.
    #[error("formatting failed")]
    Format(#[from] fmt::Error),

    /// A component reported a failure of its own.
    #[error("component failed: {0}")]
    Component(String),
}

impl RenderError {
    /// Creates a component failure.
    #[must_use]
    pub fn component(message: impl Into<String>) -> Self {
        Self::Component(message.into())
    }
}

/// A value that renders itself as HTML.
///
/// Components write into `out` (which implements [`fmt::Write`]) and may
/// read request-scoped values such as the CSRF token from `ctx`. They are
/// composable: a component can hold other components and call their
/// `render` in turn.
pub trait Component: Send + Sync {
    /// Renders into `out`.
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError>;
}

impl<C: Component + ?Sized> Component for &C {
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        (**self).render(ctx, out)
    }
}

impl<C: Component + ?Sized> Component for Box<C> {
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        (**self).render(ctx, out)
    }
}

impl<C: Component + ?Sized> Component for Arc<C> {
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        (**self).render(ctx, out)
    }
}

impl<C: Component> Component for [C] {
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        self.iter().try_for_each(|child| child.render(ctx, out))
    }
}

impl<C: Component> Component for Vec<C> {
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        self.as_slice().render(ctx, out)
    }
}

/// Component backed by a closure. Built with [`component_fn`].
pub struct FnComponent<F>(F);

impl<F> Component for FnComponent<F>
where
    F: Fn(&RequestContext, &mut BytesMut) -> Result<(), RenderError> + Send + Sync,
{
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        (self.0)(ctx, out)
    }
}

/// Wraps a closure as a component.
///
/// ```
/// use std::fmt::Write;
/// use vibefeeder_view::{component_fn, Component};
///
/// let hello = component_fn(|_ctx, out| Ok(write!(out, "<p>hello</p>")?));
/// let mut buf = bytes::BytesMut::new();
/// hello.render(&vibefeeder_core::RequestContext::new(), &mut buf).unwrap();
/// assert_eq!(&buf[..], b"<p>hello</p>");
/// ```
pub fn component_fn<F>(f: F) -> FnComponent<F>
where
    F: Fn(&RequestContext, &mut BytesMut) -> Result<(), RenderError> + Send + Sync,
{
    FnComponent(f)
}

/// Escapes text for use in HTML content and quoted attributes.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_components_compose() {
        let parts: Vec<Box<dyn Component>> = vec![
            Box::new(component_fn(|_, out| Ok(out.write_str("<b>")?))),
            Box::new(component_fn(|_, out| Ok(out.write_str("</b>")?))),
        ];
        let mut buf = BytesMut::new();
        parts.render(&RequestContext::new(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"<b></b>");
    }

    #[test]
    fn test_first_failure_stops_rendering() {
        let parts: Vec<Box<dyn Component>> = vec![
            Box::new(component_fn(|_, _| Err(RenderError::component("boom")))),
            Box::new(component_fn(|_, out| Ok(out.write_str("never")?))),
        ];
        let mut buf = BytesMut::new();
        let err = parts.render(&RequestContext::new(), &mut buf).unwrap_err();
        assert!(matches!(err, RenderError::Component(ref m) if m == "boom"));
        assert!(buf.is_empty());
    }
}
