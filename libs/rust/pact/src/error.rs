//! Contract and verification error types using thiserror 2.0.
//!
//! [`ContractError`] covers everything that stops a document from being
//! verified at all. [`InteractionError`] covers what can go wrong while
//! verifying one interaction; it is always captured into that interaction's
//! report and never aborts the others.

use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading or compiling a contract document.
#[derive(Error, Debug)]
pub enum ContractError {
    /// The document is not valid JSON or does not have the expected shape
    #[error("Failed to decode contract document: {0}")]
    DocumentDecode(#[from] serde_json::Error),

    /// The document could not be read
    #[error("Failed to read contract document: {0}")]
    Io(#[from] std::io::Error),

    /// Provider or consumer name is empty
    #[error("Contract {0} name is empty")]
    MissingParticipant(&'static str),

    /// A matching rule key is not a valid path expression
    #[error("Malformed rule expression `{expression}` in {location}: {reason}")]
    MalformedRuleExpression {
        /// Where the rule was declared, e.g. `interaction 'get users' response body`
        location: String,
        /// The expression as written
        expression: String,
        /// Why it was rejected
        reason: String,
    },

    /// A regex matcher carries a pattern that does not compile
    #[error("Invalid regex `{pattern}` in {location}: {reason}")]
    InvalidRegex {
        /// Where the rule was declared
        location: String,
        /// The pattern as written
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// Several rules were rejected; each is reported
    #[error(
        "{} malformed matching rules, first: {}",
        .0.len(),
        .0.first().map(ToString::to_string).unwrap_or_default()
    )]
    MalformedRules(Vec<ContractError>),
}

impl ContractError {
    /// Fold a list of rule errors into one error, if there are any.
    pub(crate) fn from_rule_errors(mut errors: Vec<Self>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::MalformedRules(errors)),
        }
    }

    /// Owned form of [`ContractError::rule_errors`]; other errors come back as-is.
    pub(crate) fn into_rule_errors(self) -> Vec<Self> {
        match self {
            Self::MalformedRules(errors) => errors.into_iter().flat_map(Self::into_rule_errors).collect(),
            other => vec![other],
        }
    }

    /// Each individual rule error, flattening [`ContractError::MalformedRules`].
    #[must_use]
    pub fn rule_errors(&self) -> Vec<&Self> {
        match self {
            Self::MalformedRules(errors) => errors.iter().flat_map(Self::rule_errors).collect(),
            Self::MalformedRuleExpression { .. } | Self::InvalidRegex { .. } => vec![self],
            _ => Vec::new(),
        }
    }
}

/// Failure of one interaction that happened outside the evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionError {
    /// The provider did not answer within the configured timeout
    #[error("provider did not respond within {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// The provider could not be called or failed at transport level
    #[error("provider unreachable: {reason}")]
    ProviderUnreachable {
        /// Transport error message
        reason: String,
    },

    /// The contract request could not be turned into an outbound request
    #[error("could not build request: {reason}")]
    InvalidRequest {
        /// What was wrong
        reason: String,
    },

    /// A matching rule of this interaction could not be compiled
    #[error("{reason}")]
    MalformedRule {
        /// Compiler message
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed(expression: &str) -> ContractError {
        ContractError::MalformedRuleExpression {
            location: "interaction 'a' response body".to_string(),
            expression: expression.to_string(),
            reason: "empty field name".to_string(),
        }
    }

    #[test]
    fn test_single_rule_error_is_not_wrapped() {
        let err = ContractError::from_rule_errors(vec![malformed("$.")]).unwrap();
        assert!(matches!(err, ContractError::MalformedRuleExpression { .. }));
        assert!(ContractError::from_rule_errors(Vec::new()).is_none());
    }

    #[test]
    fn test_multiple_rule_errors_are_all_reported() {
        let err = ContractError::from_rule_errors(vec![malformed("$."), malformed("$[")]).unwrap();
        assert_eq!(err.rule_errors().len(), 2);
        assert!(err.to_string().starts_with("2 malformed matching rules"));
        assert!(err.to_string().contains("`$.`"));
    }

    #[test]
    fn test_interaction_error_display() {
        let err = InteractionError::Timeout { timeout_ms: 250 };
        assert_eq!(err.to_string(), "provider did not respond within 250ms");

        let err = InteractionError::ProviderUnreachable {
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "provider unreachable: connection refused");
    }

    #[test]
    fn test_interaction_error_serializes_with_kind() {
        let json = serde_json::to_value(InteractionError::Timeout { timeout_ms: 5 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "timeout", "timeout_ms": 5}));
    }
}
