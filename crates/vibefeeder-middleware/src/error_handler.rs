//! Conversion of errors into HTTP responses.
//!
//! Every error leaving a handler or stage ends up here. Transport errors
//! keep their status; anything else becomes a 500 whose details are logged
//! but never sent to the client. The body is an HTML error page, an HTMX
//! error fragment, or a JSON envelope depending on the request.

use http::{header, HeaderMap, StatusCode};
use serde_json::json;
use vibefeeder_core::{AppError, ErrorMessage};
use vibefeeder_view::pages::{ErrorFragment, ErrorPage};
use vibefeeder_view::Renderer;

use crate::context::MiddlewareContext;
use crate::types::{MiddlewareResult, Response, ResponseExt};

const GENERIC_SERVER_ERROR: &str = "An unexpected error occurred. Please try again later.";

/// The user-facing description of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescription {
    /// Response status.
    pub status: StatusCode,
    /// Short title, e.g. "Not Found".
    pub title: &'static str,
    /// Explanation safe to show the user.
    pub message: String,
}

impl ErrorDescription {
    /// Describes `err` without leaking internal details.
    #[must_use]
    pub fn of(err: &AppError) -> Self {
        let Some(http) = err.as_http() else {
            return Self::server_error(StatusCode::INTERNAL_SERVER_ERROR);
        };

        let status = http.status();
        let fixed = |title, message: &str| Self {
            status,
            title,
            message: message.to_string(),
        };

        match status {
            StatusCode::BAD_REQUEST => fixed(
                "Bad Request",
                "The request could not be understood or was missing required parameters.",
            ),
            StatusCode::UNAUTHORIZED => fixed(
                "Unauthorized",
                "You need to be authenticated to access this resource.",
            ),
            StatusCode::FORBIDDEN => fixed(
                "Forbidden",
                "You don't have permission to access this resource.",
            ),
            StatusCode::NOT_FOUND => {
                fixed("Not Found", "The page you're looking for doesn't exist.")
            }
            StatusCode::METHOD_NOT_ALLOWED => fixed(
                "Method Not Allowed",
                "The requested method is not allowed for this resource.",
            ),
            StatusCode::PAYLOAD_TOO_LARGE => Self {
                status,
                title: "Payload Too Large",
                message: text_or(http.message(), "The request body is too large."),
            },
            StatusCode::TOO_MANY_REQUESTS => fixed(
                "Too Many Requests",
                "You've made too many requests. Please try again later.",
            ),
            StatusCode::SERVICE_UNAVAILABLE => fixed(
                "Service Unavailable",
                "The service is temporarily unavailable. Please try again later.",
            ),
            s if s.is_server_error() => Self::server_error(s),
            _ => Self {
                status,
                title: "Error",
                message: text_or(http.message(), "An error occurred. Please try again later."),
            },
        }
    }

    fn server_error(status: StatusCode) -> Self {
        Self {
            status,
            title: "Internal Server Error",
            message: GENERIC_SERVER_ERROR.to_string(),
        }
    }
}

fn text_or(message: &ErrorMessage, fallback: &str) -> String {
    match message.as_text() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => fallback.to_string(),
    }
}

/// Turns errors into responses.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandler {
    renderer: Renderer,
}

impl ErrorHandler {
    /// Creates a handler rendering pages with `renderer`.
    #[must_use]
    pub fn new(renderer: Renderer) -> Self {
        Self { renderer }
    }

    /// Builds the response for `err`.
    ///
    /// `headers` are the request headers, consulted for `Accept` and
    /// `HX-Request`.
    pub fn handle(&self, ctx: &MiddlewareContext, headers: &HeaderMap, err: &AppError) -> Response {
        if err.as_http().is_none() {
            tracing::error!(
                request_id = %ctx.request_id(),
                error = %err,
                "Request error"
            );
        } else {
            tracing::debug!(
                request_id = %ctx.request_id(),
                error = %err,
                "Request error"
            );
        }

        let description = ErrorDescription::of(err);

        if !wants_html(headers) {
            return json_response(&description, err);
        }

        let request_ctx = ctx.to_request_context();
        let rendered = if is_htmx(headers) {
            let fragment = ErrorFragment::new(description.message.clone());
            self.renderer.html(description.status, &fragment, &request_ctx)
        } else {
            let page = ErrorPage::new(
                description.status.as_u16(),
                description.title,
                description.message.clone(),
            );
            self.renderer.html(description.status, &page, &request_ctx)
        };

        rendered.unwrap_or_else(|render_err| {
            tracing::error!(error = %render_err, "Failed to render error response");
            Response::text(description.status, description.message)
        })
    }

    /// Converts a pipeline result into the final response and applies the
    /// headers queued on `ctx`.
    pub fn finalize(
        &self,
        ctx: &mut MiddlewareContext,
        headers: &HeaderMap,
        result: MiddlewareResult,
    ) -> (Response, Option<AppError>) {
        let (mut response, error) = match result {
            Ok(response) => (response, None),
            Err(err) => (self.handle(ctx, headers, &err), Some(err)),
        };
        ctx.apply_response_headers(&mut response);
        (response, error)
    }
}

fn json_response(description: &ErrorDescription, err: &AppError) -> Response {
    let mut body = json!({
        "status": "error",
        "error": description.message,
    });
    if let Some(fields) = err.as_http().and_then(|http| http.message().as_fields()) {
        body["fields"] = json!(fields);
    }
    Response::json(description.status, &body)
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Returns `true` when the `Accept` header prefers HTML over JSON.
///
/// HTML wins when `text/html` (or `text/*`) has a positive quality at least
/// as high as `application/json` (or `application/*`, `*/*`). A missing
/// header or a bare `*/*` selects JSON.
#[must_use]
pub fn wants_html(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mut html_q = 0.0_f32;
    let mut json_q = 0.0_f32;

    for item in accept.split(',') {
        let Ok(media) = item.trim().parse::<mime::Mime>() else {
            continue;
        };
        let q = media
            .get_param("q")
            .and_then(|q| q.as_str().parse::<f32>().ok())
            .unwrap_or(1.0);

        match (media.type_(), media.subtype()) {
            (mime::TEXT, mime::HTML) | (mime::TEXT, mime::STAR) => html_q = html_q.max(q),
            (mime::APPLICATION, mime::JSON)
            | (mime::APPLICATION, mime::STAR)
            | (mime::STAR, mime::STAR) => json_q = json_q.max(q),
            _ => {}
        }
    }

    html_q > 0.0 && html_q >= json_q
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http_body_util::BodyExt;
    use vibefeeder_core::{FieldErrors, HttpError};

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(value));
        headers
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_accept_negotiation() {
        assert!(!wants_html(&HeaderMap::new()));
        assert!(!wants_html(&accept("*/*")));
        assert!(!wants_html(&accept("application/json")));
        assert!(wants_html(&accept("text/html")));
        assert!(wants_html(&accept(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
        )));
        assert!(!wants_html(&accept("text/html;q=0.5, application/json")));
        assert!(!wants_html(&accept("text/html;q=0")));
    }

    #[test]
    fn test_descriptions() {
        let of = |err: AppError| ErrorDescription::of(&err);

        let d = of(HttpError::not_found("route missing").into());
        assert_eq!((d.status, d.title), (StatusCode::NOT_FOUND, "Not Found"));
        assert_eq!(d.message, "The page you're looking for doesn't exist.");

        let d = of(HttpError::new(StatusCode::CONFLICT, "Feed already exists").into());
        assert_eq!(d.title, "Error");
        assert_eq!(d.message, "Feed already exists");

        let d = of(HttpError::new(StatusCode::CONFLICT, "").into());
        assert_eq!(d.message, "An error occurred. Please try again later.");

        let d = of(HttpError::new(StatusCode::BAD_GATEWAY, "upstream leaked detail").into());
        assert_eq!(d.status, StatusCode::BAD_GATEWAY);
        assert_eq!(d.message, GENERIC_SERVER_ERROR);

        let d = of(AppError::internal("db password wrong"));
        assert_eq!(d.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(d.message, GENERIC_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_json_envelope_with_fields() {
        let fields: FieldErrors = [("Email", "This field is required")].into_iter().collect();
        let err: AppError = HttpError::with_fields(StatusCode::BAD_REQUEST, fields).into();

        let response = ErrorHandler::default().handle(&MiddlewareContext::new(), &HeaderMap::new(), &err);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(
            body["error"],
            "The request could not be understood or was missing required parameters."
        );
        assert_eq!(body["fields"]["Email"], "This field is required");
    }

    #[tokio::test]
    async fn test_internal_error_is_not_leaked() {
        let err = AppError::internal("connection string postgres://secret");
        let response = ErrorHandler::default().handle(&MiddlewareContext::new(), &HeaderMap::new(), &err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(!body.contains("secret"));
        assert!(body.contains(GENERIC_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_html_page_and_htmx_fragment() {
        let err: AppError = HttpError::forbidden("invalid csrf token").into();
        let handler = ErrorHandler::default();

        let response = handler.handle(&MiddlewareContext::new(), &accept("text/html"), &err);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let page = body_string(response).await;
        assert!(page.contains("<!DOCTYPE html>"));
        assert!(page.contains("Forbidden"));

        let mut headers = accept("text/html");
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        let fragment = body_string(handler.handle(&MiddlewareContext::new(), &headers, &err)).await;
        assert!(fragment.starts_with("<div id=\"global-errors\" hx-swap-oob=\"true\">"));
    }

    #[tokio::test]
    async fn test_cancelled_render_falls_back_to_text() {
        let mut ctx = MiddlewareContext::new();
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        ctx.set_cancellation_token(token);

        let err: AppError = HttpError::not_found("x").into();
        let response = ErrorHandler::default().handle(&ctx, &accept("text/html"), &err);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            body_string(response).await,
            "The page you're looking for doesn't exist."
        );
    }
}
