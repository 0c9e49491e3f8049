//! Built-in rule implementations.

use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::password;
use crate::rule::{RuleError, RuleInput};
use crate::value::FieldValue;

type Outcome = Result<bool, RuleError>;

/// Signature shared by every built-in rule.
pub type BuiltinRule = fn(&RuleInput<'_>) -> Outcome;

/// Tags and their implementations, registered on every new validator.
pub const BUILTINS: &[(&str, BuiltinRule)] = &[
    ("required", required),
    ("email", email),
    ("url", url),
    ("http_url", http_url),
    ("strongpassword", strong_password),
    ("min", min),
    ("max", max),
    ("len", len),
    ("gte", min),
    ("lte", max),
    ("gt", gt),
    ("lt", lt),
    ("oneof", one_of),
    ("uuid", uuid),
    ("datetime", datetime),
    ("eqfield", eq_field),
];

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email pattern is valid")
    })
}

fn string_value<'a>(input: &RuleInput<'a>) -> Result<&'a str, RuleError> {
    match input.value() {
        FieldValue::Str(s) => Ok(s),
        _ => Err(input.unsupported()),
    }
}

fn required(input: &RuleInput<'_>) -> Outcome {
    Ok(!input.value().is_zero())
}

fn email(input: &RuleInput<'_>) -> Outcome {
    Ok(email_regex().is_match(string_value(input)?))
}

fn url(input: &RuleInput<'_>) -> Outcome {
    Ok(url::Url::parse(string_value(input)?).is_ok())
}

fn http_url(input: &RuleInput<'_>) -> Outcome {
    let Ok(parsed) = url::Url::parse(string_value(input)?) else {
        return Ok(false);
    };
    let scheme_ok = matches!(parsed.scheme(), "http" | "https");
    let host_ok = parsed.host_str().is_some_and(|h| !h.is_empty());
    Ok(scheme_ok && host_ok)
}

fn strong_password(input: &RuleInput<'_>) -> Outcome {
    let value = string_value(input)?;
    let min_bits = match input.param() {
        None => password::DEFAULT_MIN_ENTROPY_BITS,
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(bits) if bits.is_finite() => bits,
            _ => return Ok(false),
        },
    };
    Ok(password::is_strong(value, min_bits))
}

/// Compares the measurable size of the value with the parameter.
///
/// Strings measure their character count, collections their length and
/// numbers themselves. A parameter that does not parse as a number yields
/// `None`, which rules treat as a failed check.
fn compare(input: &RuleInput<'_>) -> Result<Option<Ordering>, RuleError> {
    let raw = input.require_param()?.trim();
    let Ok(limit) = raw.parse::<f64>() else {
        return Ok(None);
    };

    let measured = match input.value() {
        FieldValue::Str(s) => s.chars().count() as f64,
        FieldValue::Seq(len) => len as f64,
        FieldValue::Int(n) => n as f64,
        FieldValue::Uint(n) => n as f64,
        FieldValue::Float(n) => n,
        FieldValue::Absent | FieldValue::Bool(_) => return Err(input.unsupported()),
    };
    Ok(measured.partial_cmp(&limit))
}

fn min(input: &RuleInput<'_>) -> Outcome {
    Ok(matches!(compare(input)?, Some(Ordering::Greater | Ordering::Equal)))
}

fn max(input: &RuleInput<'_>) -> Outcome {
    Ok(matches!(compare(input)?, Some(Ordering::Less | Ordering::Equal)))
}

fn len(input: &RuleInput<'_>) -> Outcome {
    Ok(matches!(compare(input)?, Some(Ordering::Equal)))
}

fn gt(input: &RuleInput<'_>) -> Outcome {
    Ok(matches!(compare(input)?, Some(Ordering::Greater)))
}

fn lt(input: &RuleInput<'_>) -> Outcome {
    Ok(matches!(compare(input)?, Some(Ordering::Less)))
}

fn one_of(input: &RuleInput<'_>) -> Outcome {
    let choices = input.require_param()?;
    let candidate = match input.value() {
        FieldValue::Str(s) => s.to_string(),
        FieldValue::Int(n) => n.to_string(),
        FieldValue::Uint(n) => n.to_string(),
        _ => return Err(input.unsupported()),
    };
    Ok(choices.split_whitespace().any(|choice| choice == candidate))
}

fn uuid(input: &RuleInput<'_>) -> Outcome {
    let value = string_value(input)?;
    Ok(value.len() == 36 && uuid::Uuid::try_parse(value).is_ok())
}

fn datetime(input: &RuleInput<'_>) -> Outcome {
    let layout = input.require_param()?;
    let value = string_value(input)?;
    Ok(DateTime::parse_from_str(value, layout).is_ok()
        || NaiveDateTime::parse_from_str(value, layout).is_ok()
        || NaiveDate::parse_from_str(value, layout).is_ok()
        || NaiveTime::parse_from_str(value, layout).is_ok())
}

fn eq_field(input: &RuleInput<'_>) -> Outcome {
    let other = input.require_param()?;
    let sibling = input.sibling(other).ok_or_else(|| RuleError::UnknownField {
        tag: input.tag().to_string(),
        other: other.to_string(),
    })?;
    Ok(sibling.value == input.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use crate::value::Field;

    fn check(rules: &'static str, value: FieldValue<'static>) -> Outcome {
        let field = Field::new("f", rules, value);
        let fields = [field];
        let rule = Rule::parse_list(rules).unwrap()[0];
        let (_, func) = BUILTINS
            .iter()
            .find(|(tag, _)| *tag == rule.tag)
            .unwrap();
        func(&RuleInput::new(rule, &fields[0], &fields))
    }

    #[test]
    fn test_required() {
        assert_eq!(check("required", FieldValue::Str("")), Ok(false));
        assert_eq!(check("required", FieldValue::Str("x")), Ok(true));
        assert_eq!(check("required", FieldValue::Int(0)), Ok(false));
        assert_eq!(check("required", FieldValue::Absent), Ok(false));
    }

    #[test]
    fn test_email() {
        assert_eq!(check("email", FieldValue::Str("john@example.com")), Ok(true));
        assert_eq!(check("email", FieldValue::Str("invalid-email")), Ok(false));
        assert_eq!(check("email", FieldValue::Str("")), Ok(false));
    }

    #[test]
    fn test_url_accepts_any_scheme() {
        assert_eq!(check("url", FieldValue::Str("ftp://files.example.com")), Ok(true));
        assert_eq!(check("url", FieldValue::Str("example.com")), Ok(false));
    }

    #[test]
    fn test_http_url() {
        assert_eq!(check("http_url", FieldValue::Str("https://example.com/feed")), Ok(true));
        assert_eq!(check("http_url", FieldValue::Str("http://localhost:8080")), Ok(true));
        assert_eq!(check("http_url", FieldValue::Str("ftp://example.com")), Ok(false));
        assert_eq!(check("http_url", FieldValue::Str("example.com")), Ok(false));
        assert_eq!(check("http_url", FieldValue::Str("")), Ok(false));
        assert_eq!(check("http_url", FieldValue::Str("mailto:a@b.c")), Ok(false));
    }

    #[test]
    fn test_strongpassword_params() {
        assert_eq!(check("strongpassword", FieldValue::Str("password")), Ok(false));
        assert_eq!(check("strongpassword", FieldValue::Str("password123")), Ok(true));
        assert_eq!(check("strongpassword=60", FieldValue::Str("password123")), Ok(false));
        assert_eq!(
            check("strongpassword=abc", FieldValue::Str("MyS3cur3P@ssw0rd!2024")),
            Ok(false)
        );
        assert_eq!(check("strongpassword=NaN", FieldValue::Str("x")), Ok(false));
    }

    #[test]
    fn test_min_max_len_on_strings_count_chars() {
        assert_eq!(check("min=3", FieldValue::Str("ab")), Ok(false));
        assert_eq!(check("min=3", FieldValue::Str("żółw")), Ok(true));
        assert_eq!(check("max=3", FieldValue::Str("żółw")), Ok(false));
        assert_eq!(check("len=4", FieldValue::Str("żółw")), Ok(true));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert_eq!(check("gte=18", FieldValue::Uint(18)), Ok(true));
        assert_eq!(check("gt=18", FieldValue::Uint(18)), Ok(false));
        assert_eq!(check("lt=0", FieldValue::Int(-1)), Ok(true));
        assert_eq!(check("lte=1.5", FieldValue::Float(1.5)), Ok(true));
        assert_eq!(check("max=2", FieldValue::Seq(3)), Ok(false));
    }

    #[test]
    fn test_malformed_numeric_param_fails_field() {
        assert_eq!(check("min=three", FieldValue::Str("abcdef")), Ok(false));
    }

    #[test]
    fn test_missing_param_is_rule_error() {
        assert!(matches!(
            check("min", FieldValue::Str("abc")),
            Err(RuleError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_comparison_on_bool_is_unsupported() {
        assert!(matches!(
            check("min=1", FieldValue::Bool(true)),
            Err(RuleError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_oneof() {
        assert_eq!(check("oneof=red green", FieldValue::Str("green")), Ok(true));
        assert_eq!(check("oneof=red green", FieldValue::Str("blue")), Ok(false));
        assert_eq!(check("oneof=1 2 3", FieldValue::Int(2)), Ok(true));
    }

    #[test]
    fn test_uuid() {
        assert_eq!(
            check("uuid", FieldValue::Str("67e55044-10b1-426f-9247-bb680e5fe0c8")),
            Ok(true)
        );
        assert_eq!(
            check("uuid", FieldValue::Str("67e5504410b1426f9247bb680e5fe0c8")),
            Ok(false)
        );
        assert_eq!(check("uuid", FieldValue::Str("nope")), Ok(false));
    }

    #[test]
    fn test_datetime() {
        assert_eq!(check("datetime=%Y-%m-%d", FieldValue::Str("2024-02-29")), Ok(true));
        assert_eq!(check("datetime=%Y-%m-%d", FieldValue::Str("2023-02-29")), Ok(false));
        assert_eq!(
            check("datetime=%Y-%m-%d %H:%M", FieldValue::Str("2024-01-01 10:30")),
            Ok(true)
        );
        assert_eq!(check("datetime=%H:%M", FieldValue::Str("23:59")), Ok(true));
    }
}
