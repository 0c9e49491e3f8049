//! The shared validator and its builder.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use vibefeeder_core::{FieldErrors, HttpError};

use crate::builtins::BUILTINS;
use crate::messages::default_message;
use crate::rule::{Rule, RuleError, RuleInput};
use crate::value::{FieldValue, Validate};

/// A registered rule implementation.
pub type RuleFn = Arc<dyn Fn(&RuleInput<'_>) -> Result<bool, RuleError> + Send + Sync>;

/// Builder for a [`Validator`].
///
/// Starts with every built-in rule registered. Custom rules and message
/// overrides are added before [`build`](Self::build); the resulting
/// validator is immutable.
///
/// # Example
///
/// ```
/// use vibefeeder_validate::Validator;
///
/// let validator = Validator::builder()
///     .register("lowercase", |input| {
///         input.value().as_str().is_some_and(|s| s == s.to_lowercase())
///     })
///     .message("lowercase", "Must be lowercase")
///     .build();
///
/// assert!(validator.has_rule("lowercase"));
/// assert!(validator.has_rule("email"));
/// ```
pub struct ValidatorBuilder {
    rules: HashMap<String, RuleFn>,
    messages: HashMap<String, String>,
}

impl ValidatorBuilder {
    /// Creates a builder preloaded with the built-in rules.
    #[must_use]
    pub fn new() -> Self {
        let rules = BUILTINS
            .iter()
            .map(|&(tag, func)| (tag.to_string(), Arc::new(func) as RuleFn))
            .collect();
        Self {
            rules,
            messages: HashMap::new(),
        }
    }

    /// Registers a rule that passes when `check` returns `true`.
    ///
    /// Replaces any rule already registered under `tag`.
    #[must_use]
    pub fn register<F>(self, tag: impl Into<String>, check: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> bool + Send + Sync + 'static,
    {
        self.register_fallible(tag, move |input| Ok(check(input)))
    }

    /// Registers a rule that can also report a broken rule definition.
    #[must_use]
    pub fn register_fallible<F>(mut self, tag: impl Into<String>, check: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> Result<bool, RuleError> + Send + Sync + 'static,
    {
        self.rules.insert(tag.into(), Arc::new(check));
        self
    }

    /// Overrides the message reported when `tag` fails.
    #[must_use]
    pub fn message(mut self, tag: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(tag.into(), message.into());
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> Validator {
        Validator {
            inner: Arc::new(Registry {
                rules: self.rules,
                messages: self.messages,
            }),
        }
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Registry {
    rules: HashMap<String, RuleFn>,
    messages: HashMap<String, String>,
}

/// Validates records against their field annotations.
///
/// Cheap to clone; clones share one read-only rule registry.
#[derive(Clone)]
pub struct Validator {
    inner: Arc<Registry>,
}

impl Validator {
    /// Creates a validator with only the built-in rules.
    #[must_use]
    pub fn new() -> Self {
        ValidatorBuilder::new().build()
    }

    /// Starts building a validator with custom rules.
    #[must_use]
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    /// Returns `true` if `tag` has an implementation.
    #[must_use]
    pub fn has_rule(&self, tag: &str) -> bool {
        self.inner.rules.contains_key(tag)
    }

    /// Validates `target`.
    ///
    /// On failure returns a 400 [`HttpError`]. Its message is a
    /// [`FieldErrors`] map with one entry per failing field, holding the
    /// message of the first failing rule in declaration order. When a rule
    /// definition itself is broken the message is plain text instead.
    pub fn validate<T: Validate + ?Sized>(&self, target: &T) -> Result<(), HttpError> {
        let fields = target.fields();
        let mut errors = FieldErrors::new();

        for field in &fields {
            let rules = Rule::parse_list(field.rules)
                .map_err(|err| definition_error(field.name, &err))?;

            let omit_empty = rules.iter().any(|r| r.tag == "omitempty");
            if omit_empty && field.value.is_zero() {
                continue;
            }

            for rule in rules.into_iter().filter(|r| r.tag != "omitempty") {
                // Missing optionals are only checked for presence.
                if field.value == FieldValue::Absent && rule.tag != "required" {
                    continue;
                }

                let passed = match self.inner.rules.get(rule.tag) {
                    Some(check) => check(&RuleInput::new(rule, field, &fields))
                        .map_err(|err| definition_error(field.name, &err))?,
                    None => false,
                };

                if !passed {
                    errors.insert_first(field.name, self.message_for(&rule));
                    break;
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(HttpError::with_fields(StatusCode::BAD_REQUEST, errors))
        }
    }

    fn message_for(&self, rule: &Rule<'_>) -> String {
        self.inner
            .messages
            .get(rule.tag)
            .cloned()
            .unwrap_or_else(|| default_message(rule))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.inner.rules.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("Validator").field("rules", &tags).finish()
    }
}

fn definition_error(field: &str, err: &RuleError) -> HttpError {
    HttpError::bad_request(format!("Validation failed on field '{field}': {err}"))
}
