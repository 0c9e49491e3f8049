//! Rule-list parsing and the input handed to rule functions.

use thiserror::Error;

use crate::value::{Field, FieldValue};

/// A rule definition that cannot be applied.
///
/// These are programming errors in the annotations rather than bad user
/// input, so they are reported as a single message instead of per field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// A rule list contained an empty entry, e.g. `required,,email`.
    #[error("empty rule name")]
    EmptyTag,

    /// A rule that needs a parameter was given none.
    #[error("rule '{tag}' requires a parameter")]
    MissingParameter {
        /// The rule tag.
        tag: String,
    },

    /// `eqfield` named a field the record does not expose.
    #[error("rule '{tag}' references unknown field '{other}'")]
    UnknownField {
        /// The rule tag.
        tag: String,
        /// The field that was referenced.
        other: String,
    },

    /// The rule does not apply to this kind of value.
    #[error("rule '{tag}' cannot be applied to a {kind} value")]
    Unsupported {
        /// The rule tag.
        tag: String,
        /// Description of the value kind.
        kind: &'static str,
    },
}

/// One `tag` or `tag=param` entry of a rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule<'a> {
    /// Rule name.
    pub tag: &'a str,
    /// Parameter after `=`, if any.
    pub param: Option<&'a str>,
}

impl<'a> Rule<'a> {
    /// Parses a comma-separated rule list, keeping declaration order.
    pub fn parse_list(rules: &'a str) -> Result<Vec<Self>, RuleError> {
        if rules.trim().is_empty() {
            return Ok(Vec::new());
        }
        rules.split(',').map(Self::parse).collect()
    }

    fn parse(entry: &'a str) -> Result<Self, RuleError> {
        let (tag, param) = match entry.split_once('=') {
            Some((tag, param)) => (tag.trim(), Some(param)),
            None => (entry.trim(), None),
        };
        if tag.is_empty() {
            return Err(RuleError::EmptyTag);
        }
        Ok(Self { tag, param })
    }
}

/// Everything a rule function can look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    tag: &'a str,
    param: Option<&'a str>,
    field: &'a Field<'a>,
    fields: &'a [Field<'a>],
}

impl<'a> RuleInput<'a> {
    pub(crate) const fn new(
        rule: Rule<'a>,
        field: &'a Field<'a>,
        fields: &'a [Field<'a>],
    ) -> Self {
        Self {
            tag: rule.tag,
            param: rule.param,
            field,
            fields,
        }
    }

    /// The rule tag being evaluated.
    #[must_use]
    pub const fn tag(&self) -> &'a str {
        self.tag
    }

    /// The value under test.
    #[must_use]
    pub const fn value(&self) -> FieldValue<'a> {
        self.field.value
    }

    /// The rule parameter, if one was given.
    #[must_use]
    pub const fn param(&self) -> Option<&'a str> {
        self.param
    }

    /// The rule parameter, or [`RuleError::MissingParameter`].
    pub fn require_param(&self) -> Result<&'a str, RuleError> {
        self.param.ok_or_else(|| RuleError::MissingParameter {
            tag: self.tag.to_string(),
        })
    }

    /// Looks up another field of the same record by key.
    #[must_use]
    pub fn sibling(&self, name: &str) -> Option<&'a Field<'a>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn unsupported(&self) -> RuleError {
        let kind = match self.value() {
            FieldValue::Absent => "missing",
            FieldValue::Str(_) => "string",
            FieldValue::Int(_) | FieldValue::Uint(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Seq(_) => "collection",
        };
        RuleError::Unsupported {
            tag: self.tag.to_string(),
            kind,
        }
    }
}
