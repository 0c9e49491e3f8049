//! Declarative struct validation.
//!
//! Structs opt in with `#[derive(Validate)]` and annotate fields with a
//! comma-separated rule list. A shared [`Validator`] checks every annotated
//! field and reports one message per failing field in a
//! [`FieldErrors`](vibefeeder_core::FieldErrors) map carried by a 400
//! [`HttpError`](vibefeeder_core::HttpError).
//!
//! ```
//! use vibefeeder_validate::{Validate, Validator};
//! use vibefeeder_core::ErrorMessage;
//!
//! #[derive(Validate)]
//! struct AddFeed {
//!     #[validate("required,max=100")]
//!     name: String,
//!     #[validate("required,http_url")]
//!     url: String,
//! }
//!
//! let validator = Validator::new();
//! let err = validator
//!     .validate(&AddFeed { name: "News".into(), url: "ftp://x".into() })
//!     .unwrap_err();
//!
//! let ErrorMessage::Fields(fields) = err.message() else { panic!() };
//! assert_eq!(fields.get("url"), Some("Must be a valid HTTP or HTTPS URL"));
//! ```
//!
//! # Rules
//!
//! | Tag | Parameter |
//! |-----|-----------|
//! | `required`, `omitempty` | - |
//! | `email`, `url`, `http_url`, `uuid` | - |
//! | `strongpassword` | minimum entropy bits, default 50 |
//! | `min`, `max`, `len`, `gte`, `lte`, `gt`, `lt` | number |
//! | `oneof` | space-separated values |
//! | `datetime` | `chrono` format string |
//! | `eqfield` | other field key |

#![doc(html_root_url = "https://docs.rs/vibefeeder-validate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

extern crate self as vibefeeder_validate;

mod builtins;
mod messages;
pub mod password;
mod rule;
mod validator;
mod value;

pub use rule::{Rule, RuleError, RuleInput};
pub use validator::{RuleFn, Validator, ValidatorBuilder};
pub use value::{AsFieldValue, Field, FieldValue, Validate};

/// Derive macro generating [`Validate`] from `#[validate(...)]` attributes.
pub use vibefeeder_macros::Validate;
