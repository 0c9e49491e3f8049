//! Request extraction for vibefeeder handlers.
//!
//! Handlers receive a fully buffered `http::Request<Bytes>`. The helpers
//! here decode cookies, query strings and URL-encoded forms from it, and
//! [`ValidatedForm`] chains decoding with the field validator so a handler
//! gets either a valid value or an error the error handler can render.

#![warn(missing_docs)]

pub mod cookie;
mod error;
mod extractor;
pub mod form;
pub mod query;

pub use cookie::{Cookies, SameSite, SetCookie};
pub use error::ExtractError;
pub use extractor::FromRequest;
pub use form::{form_value, is_form, Form, ValidatedForm};
pub use query::{query_value, Query};
