//! Procedural macros for vibefeeder.
//!
//! `#[derive(Validate)]` turns field annotations into the field list the
//! validator walks at runtime.
//!
//! # Example
//!
//! ```rust,ignore
//! use vibefeeder_validate::Validate;
//!
//! #[derive(Validate)]
//! struct SignupForm {
//!     #[validate("required,email")]
//!     email: String,
//!     #[validate("required,strongpassword=60")]
//!     password: String,
//!     #[validate(rules = "required,eqfield=password", rename = "PasswordConfirm")]
//!     password_confirm: String,
//! }
//! ```
//!
//! Only annotated fields take part in validation. A field that needs to be
//! visible to `eqfield` without rules of its own can carry `#[validate("")]`.

mod derive;
mod parse;

use proc_macro::TokenStream;

/// Derives `vibefeeder_validate::Validate` for a struct with named fields.
///
/// # Attributes
///
/// - `#[validate("tag,tag=param")]` sets the rule list
/// - `#[validate(rules = "...", rename = "Key")]` additionally overrides the
///   key used in the field-error map (defaults to the field name)
///
/// # Generated Code
///
/// ```rust,ignore
/// impl vibefeeder_validate::Validate for SignupForm {
///     fn fields(&self) -> Vec<vibefeeder_validate::Field<'_>> {
///         vec![
///             Field::new("email", "required,email", self.email.as_field_value()),
///             Field::new("password", "required,strongpassword=60", self.password.as_field_value()),
///         ]
///     }
/// }
/// ```
#[proc_macro_derive(Validate, attributes(validate))]
pub fn derive_validate(item: TokenStream) -> TokenStream {
    derive::expand_validate(item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
