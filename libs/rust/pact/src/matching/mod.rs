//! Matching rule evaluation.
//!
//! [`evaluate`] walks an expected and an actual JSON value in lock-step and
//! produces one [`FieldResult`] per compared location. Which comparison
//! applies at a location is decided by a [`RuleIndex`]:
//!
//! - a rule bound exactly to the location wins over inherited rules;
//! - among rules bound to the same location, the most specific expression
//!   wins, and equally specific rules are tried in turn (any passing rule
//!   passes the location);
//! - `type` and `equality` rules cascade to descendants that have no rule of
//!   their own, with array bounds applying only where they were declared;
//! - without any rule, values must be equal in both value and JSON type.

mod evaluator;
mod index;
mod matchers;

pub use evaluator::evaluate;
pub use index::{BoundRules, CompiledRule, CompiledRules, RuleIndex};

use crate::path::DocPath;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Why a location did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Values differ, or a matcher rejected the actual value
    FieldMismatch,
    /// A location present in the expected value is absent from the actual one
    FieldMissing,
    /// JSON types differ
    UnexpectedType,
    /// Array length violates equality or declared bounds
    LengthMismatch,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FieldMismatch => "mismatch",
            Self::FieldMissing => "missing field",
            Self::UnexpectedType => "unexpected type",
            Self::LengthMismatch => "length mismatch",
        })
    }
}

/// A failed comparison with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Category of the failure
    pub kind: MismatchKind,
    /// Explanation, e.g. ``regex `^[0-9]+$` did not match `abc` ``
    pub reason: String,
}

impl Mismatch {
    pub(crate) fn new(kind: MismatchKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// The outcome of comparing one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldResult {
    /// Location, e.g. `$.items[1].id`
    pub path: String,
    /// Expected value at the location
    pub expected: Value,
    /// Actual value at the location, if present
    pub actual: Option<Value>,
    /// Set when the comparison failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<Mismatch>,
}

impl FieldResult {
    pub(crate) fn compared(
        path: &DocPath,
        expected: &Value,
        actual: &Value,
        mismatch: Option<Mismatch>,
    ) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.clone(),
            actual: Some(actual.clone()),
            mismatch,
        }
    }

    pub(crate) fn missing(path: &DocPath, expected: &Value, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.clone(),
            actual: None,
            mismatch: Some(Mismatch::new(MismatchKind::FieldMissing, reason)),
        }
    }

    /// Whether this location matched.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.mismatch.is_none()
    }
}

impl fmt::Display for FieldResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mismatch {
            None => write!(f, "{}: ok", self.path),
            Some(mismatch) => write!(f, "{}: {}: {}", self.path, mismatch.kind, mismatch.reason),
        }
    }
}

/// Overall pass: every result passed. An empty result list passes.
#[must_use]
pub fn all_passed(results: &[FieldResult]) -> bool {
    results.iter().all(FieldResult::passed)
}
