//! Lock-step walk over expected and actual values.

use super::index::{BoundRules, CompiledRule, RuleIndex, cascade_from};
use super::matchers::{check_rules, literal};
use super::{FieldResult, Mismatch, MismatchKind};
use crate::path::DocPath;
use serde_json::Value;
use std::sync::Arc;

/// Compare `actual` against `expected` under `rules`.
///
/// Returns one result per compared location, in walk order. Objects use
/// subset semantics: keys only present in `actual` are ignored. Container
/// locations only produce a result when their own check fails.
#[must_use]
pub fn evaluate(expected: &Value, actual: &Value, rules: &RuleIndex) -> Vec<FieldResult> {
    let bound = rules.bind(actual);
    let mut walk = Walk {
        bound: &bound,
        results: Vec::new(),
    };
    walk.compare(&DocPath::root(), expected, actual, &[]);
    walk.results
}

struct Walk<'a> {
    bound: &'a BoundRules,
    results: Vec<FieldResult>,
}

impl<'a> Walk<'a> {
    fn compare(
        &mut self,
        path: &DocPath,
        expected: &Value,
        actual: &Value,
        inherited: &[Arc<CompiledRule>],
    ) {
        let bound: &'a BoundRules = self.bound;
        let exact = bound.at(path);
        let governing = exact.unwrap_or(inherited);

        match (expected, actual) {
            (Value::Object(expected_members), Value::Object(actual_members)) => {
                self.check_container(path, expected, actual, governing);
                let children = inherit(exact, inherited);
                for (key, expected_member) in expected_members {
                    let child = path.field(key.as_str());
                    match actual_members.get(key) {
                        Some(actual_member) => {
                            self.compare(&child, expected_member, actual_member, &children);
                        }
                        None => self.results.push(FieldResult::missing(
                            &child,
                            expected_member,
                            format!("field `{key}` is missing"),
                        )),
                    }
                }
            }
            (Value::Array(expected_items), Value::Array(actual_items)) => {
                self.check_container(path, expected, actual, governing);
                let children = inherit(exact, inherited);
                if governing.iter().any(|rule| rule.compares_by_template()) {
                    // Every actual element is held against the first expected one.
                    if let Some(template) = expected_items.first() {
                        for (index, actual_item) in actual_items.iter().enumerate() {
                            self.compare(&path.index(index), template, actual_item, &children);
                        }
                    }
                } else {
                    self.compare_index_wise(path, expected_items, actual_items, &children);
                }
            }
            _ => {
                let mismatch = if governing.is_empty() {
                    literal(expected, actual)
                } else {
                    check_rules(governing, expected, actual).err()
                };
                self.results
                    .push(FieldResult::compared(path, expected, actual, mismatch));
            }
        }
    }

    fn compare_index_wise(
        &mut self,
        path: &DocPath,
        expected_items: &[Value],
        actual_items: &[Value],
        children: &[Arc<CompiledRule>],
    ) {
        if expected_items.len() != actual_items.len() {
            self.results.push(FieldResult {
                path: path.to_string(),
                expected: Value::Array(expected_items.to_vec()),
                actual: Some(Value::Array(actual_items.to_vec())),
                mismatch: Some(Mismatch::new(
                    MismatchKind::LengthMismatch,
                    format!(
                        "expected {} element(s), got {}",
                        expected_items.len(),
                        actual_items.len()
                    ),
                )),
            });
        }
        for (index, expected_item) in expected_items.iter().enumerate() {
            let child = path.index(index);
            match actual_items.get(index) {
                Some(actual_item) => self.compare(&child, expected_item, actual_item, children),
                None => self.results.push(FieldResult::missing(
                    &child,
                    expected_item,
                    format!("element {index} is missing"),
                )),
            }
        }
    }

    fn check_container(
        &mut self,
        path: &DocPath,
        expected: &Value,
        actual: &Value,
        governing: &[Arc<CompiledRule>],
    ) {
        if governing.is_empty() {
            return;
        }
        if let Err(mismatch) = check_rules(governing, expected, actual) {
            self.results
                .push(FieldResult::compared(path, expected, actual, Some(mismatch)));
        }
    }
}

/// Rules children of a location start from.
///
/// A location's own cascading rules replace what it inherited; if it has
/// none, the inherited rules pass through unchanged.
fn inherit(
    exact: Option<&[Arc<CompiledRule>]>,
    inherited: &[Arc<CompiledRule>],
) -> Vec<Arc<CompiledRule>> {
    let cascaded = exact.map(cascade_from).unwrap_or_default();
    if cascaded.is_empty() {
        inherited.to_vec()
    } else {
        cascaded
    }
}
