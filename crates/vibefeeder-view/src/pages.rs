//! Built-in pages and fragments.

use std::fmt::Write;

use bytes::BytesMut;
use vibefeeder_core::{csrf_token, FieldErrors, RequestContext};

use crate::assets::asset_url;
use crate::component::{html_escape, Component, RenderError};

/// The HTML document shell.
///
/// Every page is wrapped in a layout. The `<body>` carries the CSRF token in
/// `hx-headers` so HTMX requests send it automatically, and the
/// `#global-errors` container receives out-of-band error fragments.
pub struct Layout<C> {
    /// Document title.
    pub title: String,
    /// Page body.
    pub content: C,
}

impl<C: Component> Layout<C> {
    /// Wraps `content` in the layout.
    pub fn new(title: impl Into<String>, content: C) -> Self {
        Self {
            title: title.into(),
            content,
        }
    }
}

impl<C: Component> Component for Layout<C> {
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        let headers = serde_json::json!({ "X-CSRF-Token": csrf_token(ctx) }).to_string();

        out.write_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n")?;
        out.write_str("<meta charset=\"utf-8\">\n")?;
        out.write_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        )?;
        writeln!(out, "<title>{} | VibeFeeder</title>", html_escape(&self.title))?;
        out.write_str("<link rel=\"icon\" href=\"/favicon.ico\" sizes=\"any\">\n")?;
        out.write_str("<link rel=\"icon\" href=\"/icon.svg\" type=\"image/svg+xml\">\n")?;
        out.write_str("<link rel=\"apple-touch-icon\" href=\"/apple-touch-icon.png\">\n")?;
        writeln!(
            out,
            "<link rel=\"stylesheet\" href=\"{}\">",
            html_escape(&asset_url("/static/css/app.css"))
        )?;
        writeln!(
            out,
            "<script src=\"{}\" defer></script>",
            html_escape(&asset_url("/static/js/app.js"))
        )?;
        out.write_str("</head>\n")?;
        writeln!(out, "<body hx-headers=\"{}\">", html_escape(&headers))?;
        out.write_str("<div id=\"global-errors\"></div>\n<main>\n")?;
        self.content.render(ctx, out)?;
        out.write_str("\n</main>\n</body>\n</html>\n")?;
        Ok(())
    }
}

/// Landing page body.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomePage;

impl Component for HomePage {
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        Layout::new(
            "Home",
            crate::component::component_fn(|_, out| {
                out.write_str("<section class=\"hero\">\n")?;
                out.write_str("<h1>VibeFeeder</h1>\n")?;
                out.write_str("<p>Your feeds, summarized.</p>\n")?;
                out.write_str("</section>")?;
                Ok(())
            }),
        )
        .render(ctx, out)
    }
}

/// A standalone error page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    /// HTTP status code.
    pub code: u16,
    /// Short title, e.g. "Not Found".
    pub title: String,
    /// User-facing explanation.
    pub message: String,
}

impl ErrorPage {
    /// Creates an error page.
    pub fn new(code: u16, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl Component for ErrorPage {
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        let body = crate::component::component_fn(|_, out| {
            out.write_str("<section class=\"error-page\">\n")?;
            writeln!(out, "<p class=\"error-code\">{}</p>", self.code)?;
            writeln!(out, "<h1>{}</h1>", html_escape(&self.title))?;
            writeln!(out, "<p>{}</p>", html_escape(&self.message))?;
            out.write_str("<a href=\"/\">Back to home</a>\n</section>")?;
            Ok(())
        });
        Layout::new(self.title.clone(), body).render(ctx, out)
    }
}

/// Error alert swapped out-of-band into `#global-errors` for HTMX requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFragment {
    /// User-facing explanation.
    pub message: String,
}

impl ErrorFragment {
    /// Creates a fragment.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Component for ErrorFragment {
    fn render(&self, _ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        out.write_str("<div id=\"global-errors\" hx-swap-oob=\"true\">")?;
        write!(
            out,
            "<div class=\"alert alert-error\" role=\"alert\">{}</div>",
            html_escape(&self.message)
        )?;
        out.write_str("</div>")?;
        Ok(())
    }
}

/// Hidden form input carrying the request's CSRF token.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfField;

impl Component for CsrfField {
    fn render(&self, ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        write!(
            out,
            "<input type=\"hidden\" name=\"csrf_token\" value=\"{}\">",
            html_escape(csrf_token(ctx))
        )?;
        Ok(())
    }
}

/// The error message for one form field, if there is one.
///
/// Renders nothing when `errors` is `None` or has no entry for `field`.
#[derive(Debug, Clone, Copy)]
pub struct FieldErrorList<'a> {
    errors: Option<&'a FieldErrors>,
    field: &'a str,
}

impl<'a> FieldErrorList<'a> {
    /// Creates the message component for `field`.
    #[must_use]
    pub fn new(errors: Option<&'a FieldErrors>, field: &'a str) -> Self {
        Self { errors, field }
    }
}

impl Component for FieldErrorList<'_> {
    fn render(&self, _ctx: &RequestContext, out: &mut BytesMut) -> Result<(), RenderError> {
        if let Some(message) = self.errors.and_then(|errors| errors.get(self.field)) {
            write!(
                out,
                "<p class=\"field-error\" data-field=\"{}\">{}</p>",
                html_escape(self.field),
                html_escape(message)
            )?;
        }
        Ok(())
    }
}
