//! Compiled rule sets keyed by path expression.

use crate::error::ContractError;
use crate::path::{DocPath, PathExpression};
use crate::rules::{Combine, Matcher, MatchingRule, MatchingRules};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A matcher ready to run: regexes are compiled once here.
#[derive(Debug, Clone)]
pub(crate) enum CompiledMatcher {
    Equality,
    Type { min: Option<usize>, max: Option<usize> },
    Regex { pattern: String, regex: Regex },
    Include(String),
    Integer,
    Decimal,
    Number,
    Boolean,
    Null,
    Unsupported(String),
}

impl CompiledMatcher {
    fn compile(matcher: &Matcher, location: &str) -> Result<Self, ContractError> {
        Ok(match matcher {
            Matcher::Equality => Self::Equality,
            Matcher::Type { min, max } => Self::Type {
                min: *min,
                max: *max,
            },
            Matcher::Regex { regex } => Self::Regex {
                pattern: regex.clone(),
                regex: Regex::new(&format!("^(?:{regex})$")).map_err(|err| {
                    ContractError::InvalidRegex {
                        location: location.to_string(),
                        pattern: regex.clone(),
                        reason: err.to_string(),
                    }
                })?,
            },
            Matcher::Include { value } => Self::Include(value.clone()),
            Matcher::Integer => Self::Integer,
            Matcher::Decimal => Self::Decimal,
            Matcher::Number => Self::Number,
            Matcher::Boolean => Self::Boolean,
            Matcher::Null => Self::Null,
            Matcher::Unsupported { kind } => Self::Unsupported(kind.clone()),
        })
    }

    const fn cascades(&self) -> bool {
        matches!(self, Self::Equality | Self::Type { .. })
    }
}

/// One rule with its parsed path expression.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    expression: PathExpression,
    pub(crate) combine: Combine,
    pub(crate) matchers: Vec<CompiledMatcher>,
}

impl CompiledRule {
    fn compile(
        expression: PathExpression,
        rule: &MatchingRule,
        location: &str,
    ) -> Result<Self, ContractError> {
        let matchers = rule
            .matchers
            .iter()
            .map(|matcher| CompiledMatcher::compile(matcher, location))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            expression,
            combine: rule.combine,
            matchers,
        })
    }

    /// The expression this rule is keyed by.
    #[must_use]
    pub const fn expression(&self) -> &PathExpression {
        &self.expression
    }

    /// The rule descendants inherit: only `type`/`equality` rules cascade,
    /// and array bounds stay where they were declared.
    fn cascaded(&self) -> Option<Self> {
        if self.matchers.is_empty() || !self.matchers.iter().all(CompiledMatcher::cascades) {
            return None;
        }
        let matchers = self
            .matchers
            .iter()
            .map(|matcher| match matcher {
                CompiledMatcher::Type { .. } => CompiledMatcher::Type {
                    min: None,
                    max: None,
                },
                other => other.clone(),
            })
            .collect();
        Some(Self {
            expression: self.expression.clone(),
            combine: self.combine,
            matchers,
        })
    }

    /// Whether arrays governed by this rule are compared against a template element.
    pub(crate) fn compares_by_template(&self) -> bool {
        self.matchers
            .iter()
            .any(|matcher| matches!(matcher, CompiledMatcher::Type { .. }))
    }
}

/// The rules of one category (body, headers, status, ...), compiled once.
///
/// Building the index parses every path expression and compiles every regex,
/// so malformed rules surface before any provider is called.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: Vec<Arc<CompiledRule>>,
}

impl RuleIndex {
    /// An index without rules: everything is compared literally.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile rules keyed by path expression, e.g. body rules.
    ///
    /// # Errors
    ///
    /// Returns every malformed expression and invalid regex, folded into a
    /// single [`ContractError`].
    pub fn from_expressions(
        rules: &BTreeMap<String, MatchingRule>,
        location: &str,
    ) -> Result<Self, ContractError> {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut errors = Vec::new();

        for (key, rule) in rules {
            let expression = match PathExpression::parse(key) {
                Ok(expression) => expression,
                Err(err) => {
                    errors.push(ContractError::MalformedRuleExpression {
                        location: location.to_string(),
                        expression: key.clone(),
                        reason: err.reason,
                    });
                    continue;
                }
            };
            match CompiledRule::compile(expression, rule, location) {
                Ok(rule) => compiled.push(Arc::new(rule)),
                Err(err) => errors.push(err),
            }
        }

        match ContractError::from_rule_errors(errors) {
            Some(err) => Err(err),
            None => Ok(Self { rules: compiled }),
        }
    }

    /// Compile rules keyed by a plain member name, e.g. header or metadata rules.
    ///
    /// `normalize` is applied to every name; header rules pass a lowercasing
    /// function so that lookups are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns every invalid regex, folded into a single [`ContractError`].
    pub fn from_members(
        rules: &BTreeMap<String, MatchingRule>,
        location: &str,
        normalize: fn(&str) -> String,
    ) -> Result<Self, ContractError> {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut errors = Vec::new();

        for (name, rule) in rules {
            let expression = PathExpression::member(&normalize(name));
            match CompiledRule::compile(expression, rule, location) {
                Ok(rule) => compiled.push(Arc::new(rule)),
                Err(err) => errors.push(err),
            }
        }

        match ContractError::from_rule_errors(errors) {
            Some(err) => Err(err),
            None => Ok(Self { rules: compiled }),
        }
    }

    /// Compile an optional rule that governs the root value, e.g. the status rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule carries an invalid regex.
    pub fn from_root(rule: Option<&MatchingRule>, location: &str) -> Result<Self, ContractError> {
        let rules = rule
            .map(|rule| CompiledRule::compile(PathExpression::root(), rule, location))
            .transpose()?
            .map(Arc::new)
            .into_iter()
            .collect();
        Ok(Self { rules })
    }

    /// Number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the index holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve every rule against the actual value.
    ///
    /// Wildcards expand over the elements actually present, so rules follow
    /// arrays that grew beyond the expected example. For each concrete
    /// location only the most specific rules are kept.
    #[must_use]
    pub fn bind(&self, actual: &Value) -> BoundRules {
        let mut by_path: HashMap<DocPath, (usize, Vec<Arc<CompiledRule>>)> = HashMap::new();

        for rule in &self.rules {
            let specificity = rule.expression.specificity();
            for location in rule.expression.resolve(actual) {
                let entry = by_path
                    .entry(location)
                    .or_insert_with(|| (specificity, Vec::new()));
                if specificity > entry.0 {
                    *entry = (specificity, vec![Arc::clone(rule)]);
                } else if specificity == entry.0 {
                    entry.1.push(Arc::clone(rule));
                }
            }
        }

        BoundRules { by_path }
    }
}

/// Every category of a [`MatchingRules`] block, compiled.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    /// Request path rule, bound to the root
    pub path: RuleIndex,
    /// Query rules keyed by parameter name
    pub query: RuleIndex,
    /// Header rules keyed by lowercased header name
    pub header: RuleIndex,
    /// Body rules keyed by path expression
    pub body: RuleIndex,
    /// Status rule, bound to the root
    pub status: RuleIndex,
    /// Message metadata rules keyed by metadata key
    pub metadata: RuleIndex,
}

impl CompiledRules {
    /// Compile all categories. `location` prefixes error locations, e.g.
    /// `interaction 'get users' response`.
    ///
    /// # Errors
    ///
    /// Returns every malformed rule across all categories.
    pub fn compile(rules: &MatchingRules, location: &str) -> Result<Self, ContractError> {
        let mut errors = Vec::new();
        let mut collect = |result: Result<RuleIndex, ContractError>| {
            result.unwrap_or_else(|err| {
                errors.extend(err.into_rule_errors());
                RuleIndex::empty()
            })
        };

        let compiled = Self {
            path: collect(RuleIndex::from_root(rules.path.as_ref(), &format!("{location} path"))),
            query: collect(RuleIndex::from_members(&rules.query, &format!("{location} query"), str::to_string)),
            header: collect(RuleIndex::from_members(
                &rules.header,
                &format!("{location} header"),
                str::to_ascii_lowercase,
            )),
            body: collect(RuleIndex::from_expressions(&rules.body, &format!("{location} body"))),
            status: collect(RuleIndex::from_root(rules.status.as_ref(), &format!("{location} status"))),
            metadata: collect(RuleIndex::from_members(
                &rules.metadata,
                &format!("{location} metadata"),
                str::to_string,
            )),
        };

        match ContractError::from_rule_errors(errors) {
            Some(err) => Err(err),
            None => Ok(compiled),
        }
    }
}

/// Rules resolved to the concrete locations of one actual value.
#[derive(Debug, Default)]
pub struct BoundRules {
    by_path: HashMap<DocPath, (usize, Vec<Arc<CompiledRule>>)>,
}

impl BoundRules {
    /// Rules bound exactly to `path`; only the most specific ones are kept.
    #[must_use]
    pub fn at(&self, path: &DocPath) -> Option<&[Arc<CompiledRule>]> {
        self.by_path
            .get(path)
            .map(|(_, rules)| rules.as_slice())
    }

    /// Number of locations that have at least one rule.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Whether no rule applies anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

/// Rules that descendants of a location inherit from it.
pub(crate) fn cascade_from(rules: &[Arc<CompiledRule>]) -> Vec<Arc<CompiledRule>> {
    rules
        .iter()
        .filter_map(|rule| rule.cascaded())
        .map(Arc::new)
        .collect()
}
