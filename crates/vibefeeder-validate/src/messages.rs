//! User-facing messages for failed rules.

use crate::rule::Rule;

/// Returns the message shown when `rule` is the first failure for a field.
pub fn default_message(rule: &Rule<'_>) -> String {
    let param = rule.param.unwrap_or_default();
    match rule.tag {
        "required" => "This field is required".to_string(),
        "email" => "Must be a valid email address".to_string(),
        "url" => "Must be a valid URL".to_string(),
        "http_url" => "Must be a valid HTTP or HTTPS URL".to_string(),
        "strongpassword" => "Make password longer or add numbers and symbols".to_string(),
        "min" => format!("Must be at least {param} characters long"),
        "max" => format!("Must be at most {param} characters long"),
        "len" => format!("Must be exactly {param} characters long"),
        "gte" => format!("Must be greater than or equal to {param}"),
        "lte" => format!("Must be less than or equal to {param}"),
        "gt" => format!("Must be greater than {param}"),
        "lt" => format!("Must be less than {param}"),
        "oneof" => format!(
            "Must be one of: {}",
            param.split_whitespace().collect::<Vec<_>>().join(", ")
        ),
        "uuid" => "Must be a valid UUID".to_string(),
        "datetime" => format!("Must be a valid datetime in format {param}"),
        "eqfield" => format!("Must match {param}"),
        tag => format!("Failed validation: {tag}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(tag: &str, param: Option<&str>) -> String {
        default_message(&Rule { tag, param })
    }

    #[test]
    fn test_parameterised_messages() {
        assert_eq!(message("min", Some("8")), "Must be at least 8 characters long");
        assert_eq!(message("len", Some("6")), "Must be exactly 6 characters long");
        assert_eq!(message("gte", Some("1")), "Must be greater than or equal to 1");
        assert_eq!(message("lt", Some("10")), "Must be less than 10");
        assert_eq!(message("oneof", Some("rss atom")), "Must be one of: rss, atom");
        assert_eq!(
            message("datetime", Some("%Y-%m-%d")),
            "Must be a valid datetime in format %Y-%m-%d"
        );
        assert_eq!(message("eqfield", Some("Password")), "Must match Password");
    }

    #[test]
    fn test_unknown_tag_message() {
        assert_eq!(message("isbn", None), "Failed validation: isbn");
    }
}
