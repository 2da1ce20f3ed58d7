//! Applying matchers and rules to a single pair of values.

use super::index::{CompiledMatcher, CompiledRule};
use super::{Mismatch, MismatchKind};
use crate::rules::Combine;
use serde_json::{Map, Number, Value};
use std::sync::Arc;

/// JSON type name as used in mismatch reasons.
pub(crate) const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deep equality where numbers compare by value (`1` equals `1.0`).
pub(crate) fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(e), Value::Number(a)) => numbers_equal(e, a),
        (Value::Array(e), Value::Array(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(e, a)| values_equal(e, a))
        }
        (Value::Object(e), Value::Object(a)) => {
            e.len() == a.len()
                && e.iter()
                    .all(|(key, e)| a.get(key).is_some_and(|a| values_equal(e, a)))
        }
        _ => expected == actual,
    }
}

#[allow(clippy::float_cmp)]
fn numbers_equal(expected: &Number, actual: &Number) -> bool {
    if let (Some(e), Some(a)) = (expected.as_i64(), actual.as_i64()) {
        return e == a;
    }
    if let (Some(e), Some(a)) = (expected.as_u64(), actual.as_u64()) {
        return e == a;
    }
    match (expected.as_f64(), actual.as_f64()) {
        (Some(e), Some(a)) => e == a,
        _ => false,
    }
}

/// Literal comparison used where no rule governs a location.
pub(crate) fn literal(expected: &Value, actual: &Value) -> Option<Mismatch> {
    if type_name(expected) != type_name(actual) {
        return Some(type_mismatch(expected, actual));
    }
    if values_equal(expected, actual) {
        None
    } else {
        Some(Mismatch::new(
            MismatchKind::FieldMismatch,
            format!("expected {} but was {}", render(expected), render(actual)),
        ))
    }
}

fn type_mismatch(expected: &Value, actual: &Value) -> Mismatch {
    Mismatch::new(
        MismatchKind::UnexpectedType,
        format!(
            "type mismatch: expected {}, got {}",
            type_name(expected),
            type_name(actual)
        ),
    )
}

/// Compact rendering of a value for reasons; long values are truncated.
fn render(value: &Value) -> String {
    const LIMIT: usize = 80;
    let text = value.to_string();
    if text.chars().count() <= LIMIT {
        text
    } else {
        let cut: String = text.chars().take(LIMIT).collect();
        format!("{cut}...")
    }
}

/// The string form regex and include matchers work on.
fn as_match_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn not_applicable(matcher: &str, actual: &Value) -> Mismatch {
    Mismatch::new(
        MismatchKind::FieldMismatch,
        format!("{matcher} matcher cannot be applied to {}", type_name(actual)),
    )
}

fn expect_class(actual: &Value, accepted: bool, class: &str) -> Result<(), Mismatch> {
    if accepted {
        Ok(())
    } else {
        Err(Mismatch::new(
            MismatchKind::FieldMismatch,
            format!("expected {class}, got {}", render(actual)),
        ))
    }
}

impl CompiledMatcher {
    /// Check one matcher.
    ///
    /// For containers, only the container itself is checked (its type, and
    /// array bounds); members and elements are compared separately.
    pub(crate) fn check(&self, expected: &Value, actual: &Value) -> Result<(), Mismatch> {
        match self {
            Self::Equality => match (expected, actual) {
                (Value::Object(expected), Value::Object(actual)) => same_keys(expected, actual),
                (Value::Array(_), Value::Array(_)) => Ok(()),
                _ => literal(expected, actual).map_or(Ok(()), Err),
            },
            Self::Type { min, max } => {
                if type_name(expected) != type_name(actual) {
                    return Err(type_mismatch(expected, actual));
                }
                if let Value::Array(items) = actual {
                    check_bounds(items.len(), *min, *max)?;
                }
                Ok(())
            }
            Self::Regex { pattern, regex } => {
                let text = as_match_string(actual).ok_or_else(|| not_applicable("regex", actual))?;
                if regex.is_match(&text) {
                    Ok(())
                } else {
                    Err(Mismatch::new(
                        MismatchKind::FieldMismatch,
                        format!("regex `{pattern}` did not match `{text}`"),
                    ))
                }
            }
            Self::Include(needle) => {
                let text = as_match_string(actual).ok_or_else(|| not_applicable("include", actual))?;
                if text.contains(needle.as_str()) {
                    Ok(())
                } else {
                    Err(Mismatch::new(
                        MismatchKind::FieldMismatch,
                        format!("`{text}` does not include `{needle}`"),
                    ))
                }
            }
            Self::Integer => expect_class(
                actual,
                actual.is_i64() || actual.is_u64(),
                "an integer",
            ),
            Self::Decimal => expect_class(actual, actual.is_f64(), "a decimal number"),
            Self::Number => expect_class(actual, actual.is_number(), "a number"),
            Self::Boolean => expect_class(actual, actual.is_boolean(), "a boolean"),
            Self::Null => expect_class(actual, actual.is_null(), "null"),
            Self::Unsupported(kind) => Err(Mismatch::new(
                MismatchKind::FieldMismatch,
                format!("unsupported matcher `{kind}`"),
            )),
        }
    }
}

/// Equality on objects: no key may be added or dropped. Member values are
/// compared as the walk descends.
fn same_keys(expected: &Map<String, Value>, actual: &Map<String, Value>) -> Result<(), Mismatch> {
    let listed = |label: &str, keys: Vec<&String>| {
        (!keys.is_empty()).then(|| {
            let keys: Vec<String> = keys.iter().map(|key| format!("`{key}`")).collect();
            format!("{label} field(s) {}", keys.join(", "))
        })
    };
    let problems: Vec<String> = [
        listed("unexpected", actual.keys().filter(|key| !expected.contains_key(*key)).collect()),
        listed("missing", expected.keys().filter(|key| !actual.contains_key(*key)).collect()),
    ]
    .into_iter()
    .flatten()
    .collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(Mismatch::new(MismatchKind::FieldMismatch, problems.join("; ")))
    }
}

fn check_bounds(len: usize, min: Option<usize>, max: Option<usize>) -> Result<(), Mismatch> {
    if let Some(min) = min.filter(|min| len < *min) {
        return Err(Mismatch::new(
            MismatchKind::LengthMismatch,
            format!("expected at least {min} element(s), got {len}"),
        ));
    }
    if let Some(max) = max.filter(|max| len > *max) {
        return Err(Mismatch::new(
            MismatchKind::LengthMismatch,
            format!("expected at most {max} element(s), got {len}"),
        ));
    }
    Ok(())
}

/// Check one rule according to its combine mode.
pub(crate) fn check_rule(rule: &CompiledRule, expected: &Value, actual: &Value) -> Result<(), Mismatch> {
    match rule.combine {
        Combine::And => rule
            .matchers
            .iter()
            .try_for_each(|matcher| matcher.check(expected, actual)),
        Combine::Or => {
            if rule.matchers.is_empty() {
                return Err(Mismatch::new(
                    MismatchKind::FieldMismatch,
                    "OR rule without matchers never matches",
                ));
            }
            let mut failures = Vec::with_capacity(rule.matchers.len());
            for matcher in &rule.matchers {
                match matcher.check(expected, actual) {
                    Ok(()) => return Ok(()),
                    Err(mismatch) => failures.push(mismatch),
                }
            }
            Err(combine_failures("no matcher passed", failures))
        }
    }
}

/// Check the rules governing one location.
///
/// Several rules only appear here when their expressions are equally
/// specific; the location passes if any of them passes.
pub(crate) fn check_rules(
    rules: &[Arc<CompiledRule>],
    expected: &Value,
    actual: &Value,
) -> Result<(), Mismatch> {
    if let [rule] = rules {
        return check_rule(rule, expected, actual);
    }
    let mut failures = Vec::with_capacity(rules.len());
    for rule in rules {
        match check_rule(rule, expected, actual) {
            Ok(()) => return Ok(()),
            Err(mismatch) => failures.push(mismatch),
        }
    }
    Err(combine_failures("no rule passed", failures))
}

fn combine_failures(prefix: &str, mut failures: Vec<Mismatch>) -> Mismatch {
    if failures.len() == 1 {
        return failures.remove(0);
    }
    let kind = failures
        .first()
        .map_or(MismatchKind::FieldMismatch, |mismatch| mismatch.kind);
    let reasons: Vec<&str> = failures.iter().map(|mismatch| mismatch.reason.as_str()).collect();
    Mismatch::new(kind, format!("{prefix}: {}", reasons.join("; ")))
}
