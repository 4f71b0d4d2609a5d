//! In-memory evaluation of rule expressions against JSON input.
//!
//! Clauses needing the database (`exists:`, `unique:`) and clauses this
//! evaluator does not know are reported as deferred instead of passing or
//! failing silently.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::rules::RuleExpression;

#[allow(clippy::expect_used)]
static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([ T]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$")
        .expect("date regex should be valid")
});

/// Result of checking one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOutcome {
    pub errors: Vec<String>,
    pub deferred: Vec<String>,
}

/// Result of checking a whole input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: BTreeMap<String, Vec<String>>,
    /// Clauses left for a database-backed validator, per field.
    pub deferred: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn record(&mut self, field: &str, outcome: FieldOutcome) {
        if !outcome.errors.is_empty() {
            self.errors.insert(field.to_string(), outcome.errors);
        }
        if !outcome.deferred.is_empty() {
            self.deferred.insert(field.to_string(), outcome.deferred);
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `Y-m-d H:i:s` style format to an anchored regex.
fn format_regex(format: &str) -> Option<Regex> {
    let mut pattern = String::from("^");
    for c in format.chars() {
        match c {
            'Y' => pattern.push_str(r"\d{4}"),
            'y' | 'm' | 'd' | 'H' | 'i' | 's' => pattern.push_str(r"\d{2}"),
            'n' | 'j' | 'G' => pattern.push_str(r"\d{1,2}"),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).ok()
}

/// Check `value` (absent when `None`) against `rule`.
pub fn validate_value(rule: &RuleExpression, value: Option<&Value>) -> FieldOutcome {
    let mut outcome = FieldOutcome::default();
    let required = rule.has("required");

    match value {
        None if rule.has("sometimes") || !required => return outcome,
        None => {
            outcome.errors.push("is required".into());
            return outcome;
        }
        Some(v) if required && is_blank(v) => {
            outcome.errors.push("is required".into());
            return outcome;
        }
        Some(Value::Null) if rule.has("nullable") => return outcome,
        Some(_) => {}
    }
    let Some(value) = value else {
        return outcome;
    };

    for clause in rule.clauses() {
        let (name, arg) = match clause.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (clause.as_str(), None),
        };
        let error = match (name, arg) {
            ("required" | "nullable" | "sometimes", _) => None,
            ("string", _) => (!value.is_string()).then(|| "must be a string".to_string()),
            ("integer", _) => (!(value.is_i64() || value.is_u64())).then(|| "must be an integer".to_string()),
            ("numeric", _) => as_number(value).is_none().then(|| "must be numeric".to_string()),
            ("boolean", _) => {
                let ok = value.is_boolean() || matches!(value.as_i64(), Some(0 | 1));
                (!ok).then(|| "must be a boolean".to_string())
            }
            ("max", Some(limit)) => check_max(value, limit),
            ("in", Some(options)) => {
                let actual = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (!options.split(',').any(|o| o == actual))
                    .then(|| format!("must be one of {options}"))
            }
            ("date", None) => {
                let ok = value.as_str().is_some_and(|s| DATE_REGEX.is_match(s));
                (!ok).then(|| "must be a date".to_string())
            }
            ("date_format", Some(format)) => {
                let ok = match (value.as_str(), format_regex(format)) {
                    (Some(s), Some(re)) => re.is_match(s),
                    _ => false,
                };
                (!ok).then(|| format!("must match the format {format}"))
            }
            _ => {
                outcome.deferred.push(clause.clone());
                None
            }
        };
        if let Some(error) = error {
            outcome.errors.push(error);
        }
    }
    outcome
}

fn check_max(value: &Value, limit: &str) -> Option<String> {
    let Ok(limit) = limit.trim().parse::<f64>() else {
        return Some(format!("has an invalid max:{limit} rule"));
    };
    let size = match value {
        Value::String(s) => s.chars().count() as f64,
        Value::Array(items) => items.len() as f64,
        other => as_number(other)?,
    };
    (size > limit).then(|| format!("must not be greater than {limit}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn check(rule: &str, value: Option<Value>) -> FieldOutcome {
        validate_value(&RuleExpression::parse(rule), value.as_ref())
    }

    #[test]
    fn required_fields_must_be_present_and_non_blank() {
        assert_eq!(check("required|string", None).errors, vec!["is required"]);
        assert_eq!(check("required|string", Some(json!("  "))).errors, vec!["is required"]);
        assert!(check("required|string", Some(json!("ok"))).errors.is_empty());
    }

    #[test]
    fn optional_and_nullable_fields() {
        assert!(check("nullable|integer", None).errors.is_empty());
        assert!(check("nullable|integer", Some(Value::Null)).errors.is_empty());
        assert!(check("sometimes|string|max:3", None).errors.is_empty());
        assert_eq!(
            check("sometimes|string|max:3", Some(json!("abcd"))).errors,
            vec!["must not be greater than 3"]
        );
    }

    #[test]
    fn type_clauses() {
        assert!(!check("required|integer", Some(json!("12"))).errors.is_empty());
        assert!(check("required|numeric", Some(json!("12.5"))).errors.is_empty());
        assert!(check("required|boolean", Some(json!(1))).errors.is_empty());
        assert!(!check("required|boolean", Some(json!("yes"))).errors.is_empty());
        assert!(check("required|string|in:draft,published", Some(json!("draft"))).errors.is_empty());
        assert!(!check("required|string|in:draft,published", Some(json!("gone"))).errors.is_empty());
    }

    #[test]
    fn date_clauses() {
        assert!(check("required|date", Some(json!("2024-02-29"))).errors.is_empty());
        assert!(check("required|date", Some(json!("2024-02-29T10:00:00Z"))).errors.is_empty());
        assert!(!check("required|date", Some(json!("yesterday"))).errors.is_empty());
        assert!(check("required|date_format:Y-m-d H:i", Some(json!("2024-01-05 09:30"))).errors.is_empty());
        assert!(!check("required|date_format:Y-m-d H:i", Some(json!("2024-01-05"))).errors.is_empty());
    }

    #[test]
    fn database_clauses_are_deferred() {
        let outcome = check("required|integer|exists:people,id", Some(json!(3)));
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.deferred, vec!["exists:people,id"]);
    }
}
