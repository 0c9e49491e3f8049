//! Double-submit CSRF protection.
//!
//! Every response carries a `csrf_token` cookie. Requests with an unsafe
//! method must echo the cookie's value back, either in the `csrf_token`
//! form field or in the `X-CSRF-Token` header (which HTMX sends from the
//! layout's `hx-headers`). The token for the current request is exposed to
//! handlers and components through [`CsrfToken`].

use http::{header, Method};
use rand::distributions::Alphanumeric;
use rand::Rng;
use subtle::ConstantTimeEq;
use vibefeeder_core::HttpError;
use vibefeeder_extract::{form_value, Cookies, SameSite, SetCookie};

use crate::context::{CsrfToken, MiddlewareContext};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{MiddlewareResult, Request};

/// Name of the token cookie.
pub const CSRF_COOKIE: &str = "csrf_token";
/// Name of the form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";
/// Name of the header carrying the token.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

const TOKEN_LENGTH: usize = 32;
const COOKIE_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// Issues and checks CSRF tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfProtection {
    secure_cookie: bool,
}

impl CsrfProtection {
    /// Creates the stage. `secure_cookie` sets the cookie's `Secure` flag.
    #[must_use]
    pub const fn new(secure_cookie: bool) -> Self {
        Self { secure_cookie }
    }

    fn cookie(&self, token: &str) -> SetCookie {
        SetCookie::new(CSRF_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure_cookie)
            .max_age_secs(COOKIE_MAX_AGE_SECS)
    }
}

impl Middleware for CsrfProtection {
    fn name(&self) -> &'static str {
        "csrf"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            let token = cookie_token(&request).unwrap_or_else(generate_token);

            if let Some(value) = self.cookie(&token).to_header() {
                ctx.add_response_header(header::SET_COOKIE, value);
            }
            ctx.set_extension(CsrfToken(token.clone()));
            request.extensions_mut().insert(CsrfToken(token.clone()));

            if !is_safe(request.method()) {
                match submitted_token(&request) {
                    None => {
                        tracing::debug!(request_id = %ctx.request_id(), "CSRF token missing");
                        return Err(HttpError::forbidden("missing csrf token").into());
                    }
                    Some(submitted) if !tokens_match(&submitted, &token) => {
                        tracing::debug!(request_id = %ctx.request_id(), "CSRF token mismatch");
                        return Err(HttpError::forbidden("invalid csrf token").into());
                    }
                    Some(_) => {}
                }
            }

            next.run(ctx, request).await
        })
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn cookie_token(request: &Request) -> Option<String> {
    let cookies = Cookies::from_headers(request.headers()).ok()?;
    cookies
        .get(CSRF_COOKIE)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// The form field when present and non-empty, otherwise the header. Only
/// one source is compared: a wrong form value is not rescued by the header.
fn submitted_token(request: &Request) -> Option<String> {
    form_value(request.headers(), request.body(), CSRF_FIELD)
        .filter(|token| !token.is_empty())
        .or_else(|| {
            request
                .headers()
                .get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
}

fn tokens_match(submitted: &str, expected: &str) -> bool {
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// A fresh random alphanumeric token.
#[must_use]
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
