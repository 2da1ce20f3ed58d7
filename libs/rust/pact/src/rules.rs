//! Matching rule and generator declarations as written in a contract.
//!
//! These are plain data. Compilation into something the evaluator can run
//! (parsed path expressions, compiled regexes) happens in
//! [`crate::matching::RuleIndex`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Matching rules attached to a request, response or message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchingRules {
    /// Rule for the request path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<MatchingRule>,
    /// Rules keyed by query parameter name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, MatchingRule>,
    /// Rules keyed by header name (case-insensitive)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub header: BTreeMap<String, MatchingRule>,
    /// Rules keyed by body path expression, e.g. `$.items[*].id`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub body: BTreeMap<String, MatchingRule>,
    /// Rule for the response status code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MatchingRule>,
    /// Rules keyed by message metadata key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, MatchingRule>,
}

impl MatchingRules {
    /// True when no category declares any rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_none()
            && self.status.is_none()
            && self.query.is_empty()
            && self.header.is_empty()
            && self.body.is_empty()
            && self.metadata.is_empty()
    }
}

/// How the matchers of one rule are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combine {
    /// Every matcher must pass. No matchers at all passes.
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    /// At least one matcher must pass. No matchers at all fails.
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl fmt::Display for Combine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
        }
    }
}

/// A combination mode plus an ordered list of matchers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchingRule {
    /// Combination mode
    #[serde(default)]
    pub combine: Combine,
    /// Matchers, in declaration order
    #[serde(default)]
    pub matchers: Vec<Matcher>,
}

impl MatchingRule {
    /// A rule with a single matcher.
    #[must_use]
    pub fn single(matcher: Matcher) -> Self {
        Self {
            combine: Combine::And,
            matchers: vec![matcher],
        }
    }

    /// A rule combining all given matchers.
    #[must_use]
    pub const fn all(matchers: Vec<Matcher>) -> Self {
        Self {
            combine: Combine::And,
            matchers,
        }
    }

    /// A rule passing when any given matcher passes.
    #[must_use]
    pub const fn any(matchers: Vec<Matcher>) -> Self {
        Self {
            combine: Combine::Or,
            matchers,
        }
    }
}

/// One comparison strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMatcher", into = "RawMatcher")]
pub enum Matcher {
    /// Literal deep equality
    Equality,
    /// Same JSON type; on arrays, optional length bounds
    Type {
        /// Minimum array length
        min: Option<usize>,
        /// Maximum array length
        max: Option<usize>,
    },
    /// The value as a string must fully match the pattern
    Regex {
        /// Pattern, anchored at both ends when evaluated
        regex: String,
    },
    /// The value as a string must contain the substring
    Include {
        /// Required substring
        value: String,
    },
    /// A number without fractional part
    Integer,
    /// A number with a fractional part
    Decimal,
    /// Any number
    Number,
    /// A boolean
    Boolean,
    /// Exactly `null`
    Null,
    /// A matcher kind this verifier does not implement; always fails
    Unsupported {
        /// The `match` value as written
        kind: String,
    },
}

impl Matcher {
    /// Shorthand for a type matcher without bounds.
    #[must_use]
    pub const fn of_type() -> Self {
        Self::Type {
            min: None,
            max: None,
        }
    }

    /// Shorthand for a regex matcher.
    #[must_use]
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex {
            regex: pattern.into(),
        }
    }

    /// The `match` kind name used in contract documents.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Equality => "equality",
            Self::Type { .. } => "type",
            Self::Regex { .. } => "regex",
            Self::Include { .. } => "include",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Unsupported { kind } => kind,
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type {
                min: Some(min),
                max: Some(max),
            } => write!(f, "type(min={min}, max={max})"),
            Self::Type { min: Some(min), .. } => write!(f, "type(min={min})"),
            Self::Type { max: Some(max), .. } => write!(f, "type(max={max})"),
            Self::Regex { regex } => write!(f, "regex `{regex}`"),
            Self::Include { value } => write!(f, "include `{value}`"),
            other => f.write_str(other.kind()),
        }
    }
}

/// Wire shape of a matcher: `{"match": "...", "regex": ..., "min": ...}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawMatcher {
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl TryFrom<RawMatcher> for Matcher {
    type Error = String;

    fn try_from(raw: RawMatcher) -> Result<Self, Self::Error> {
        // Older documents omit `match` and let the parameters imply the kind.
        let kind = match raw.kind.as_deref() {
            Some(kind) => kind.to_string(),
            None if raw.regex.is_some() => "regex".to_string(),
            None if raw.min.is_some() || raw.max.is_some() => "type".to_string(),
            None => return Err("matcher is missing its `match` kind".to_string()),
        };

        if let (Some(min), Some(max)) = (raw.min, raw.max) {
            if min > max {
                return Err(format!("matcher min ({min}) is greater than max ({max})"));
            }
        }

        let matcher = match kind.as_str() {
            "equality" => Self::Equality,
            "type" => Self::Type {
                min: raw.min,
                max: raw.max,
            },
            "min" => Self::Type {
                min: Some(raw.min.ok_or("`min` matcher requires a `min` value")?),
                max: raw.max,
            },
            "max" => Self::Type {
                min: raw.min,
                max: Some(raw.max.ok_or("`max` matcher requires a `max` value")?),
            },
            "regex" => Self::Regex {
                regex: raw.regex.ok_or("`regex` matcher requires a `regex` value")?,
            },
            "include" => Self::Include {
                value: raw.value.ok_or("`include` matcher requires a `value`")?,
            },
            "integer" => Self::Integer,
            "decimal" => Self::Decimal,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            _ => Self::Unsupported { kind: kind.clone() },
        };
        Ok(matcher)
    }
}

impl From<Matcher> for RawMatcher {
    fn from(matcher: Matcher) -> Self {
        let kind = Some(matcher.kind().to_string());
        match matcher {
            Matcher::Type { min, max } => Self {
                kind,
                min,
                max,
                ..Self::default()
            },
            Matcher::Regex { regex } => Self {
                kind,
                regex: Some(regex),
                ..Self::default()
            },
            Matcher::Include { value } => Self {
                kind,
                value: Some(value),
                ..Self::default()
            },
            _ => Self {
                kind,
                ..Self::default()
            },
        }
    }
}

/// Value generators, keyed the same way as matching rules.
///
/// Generators only matter when a contract is authored or replayed by a
/// mock; verification carries them along untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Generators {
    /// Generator for the request path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Generator>,
    /// Generators keyed by query parameter name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, Generator>,
    /// Generators keyed by header name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub header: BTreeMap<String, Generator>,
    /// Generators keyed by body path expression
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub body: BTreeMap<String, Generator>,
}

impl Generators {
    /// True when nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.query.is_empty() && self.header.is_empty() && self.body.is_empty()
    }
}

/// A single generator specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Generator {
    /// Generator type, e.g. `RandomInt` or `Uuid`
    #[serde(rename = "type")]
    pub kind: String,
    /// Lower bound for numeric generators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    /// Upper bound for numeric generators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    /// Number of digits for decimal generators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digits: Option<u32>,
    /// Length for string generators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Pattern for regex generators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Format for date/time generators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}
