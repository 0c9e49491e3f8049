//! Template-facing CSRF token slot.
//!
//! The middleware stores the token on the HTTP request under its own key;
//! this slot is the copy that travels inside [`RequestContext`] into
//! rendering. The key type is private so nothing else can read or overwrite
//! it except through these two functions.

use crate::context::RequestContext;

struct CsrfSlot(String);

/// Returns the CSRF token carried by `ctx`, or `""` when none is set.
#[must_use]
pub fn csrf_token(ctx: &RequestContext) -> &str {
    ctx.value::<CsrfSlot>().map_or("", |slot| slot.0.as_str())
}

/// Returns a new context carrying `token`.
#[must_use]
pub fn with_csrf_token(ctx: &RequestContext, token: impl Into<String>) -> RequestContext {
    ctx.with_value(CsrfSlot(token.into()))
}
