//! Verification reports.
//!
//! Reports are plain data: they serialize with serde and render a one-line
//! summary, and leave presentation to the caller.

use crate::error::InteractionError;
use crate::matching::{FieldResult, all_passed};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Results of one evaluator pass (status, headers, body, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    /// One result per compared location
    pub results: Vec<FieldResult>,
}

impl CheckReport {
    /// Wrap evaluator results.
    #[must_use]
    pub const fn new(results: Vec<FieldResult>) -> Self {
        Self { results }
    }

    /// Whether every location matched.
    #[must_use]
    pub fn passed(&self) -> bool {
        all_passed(&self.results)
    }

    /// Failed locations only.
    pub fn failures(&self) -> impl Iterator<Item = &FieldResult> {
        self.results.iter().filter(|result| !result.passed())
    }

    fn describe(&self, name: &str) -> String {
        match self.failures().next() {
            None => format!("{name} ok"),
            Some(first) => {
                let more = self.failures().count() - 1;
                if more == 0 {
                    format!("{name} mismatch at `{}`", first.path)
                } else {
                    format!("{name} mismatch at `{}` (+{more} more)", first.path)
                }
            }
        }
    }
}

/// How an interaction ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InteractionOutcome {
    /// Status, headers and body all matched
    Passed,
    /// The provider answered but something did not match
    Failed,
    /// The provider could not be verified at all
    Errored {
        /// What went wrong
        error: InteractionError,
    },
}

/// The verification of one interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionReport {
    /// Interaction description
    pub description: String,
    /// Provider state names the caller was expected to set up
    pub provider_states: Vec<String>,
    /// Overall outcome
    #[serde(flatten)]
    pub outcome: InteractionOutcome,
    /// Status pass
    pub status: CheckReport,
    /// Header pass
    pub headers: CheckReport,
    /// Body pass
    pub body: CheckReport,
}

impl InteractionReport {
    /// Report for an interaction that could not be verified.
    #[must_use]
    pub fn errored(
        description: impl Into<String>,
        provider_states: Vec<String>,
        error: InteractionError,
    ) -> Self {
        Self {
            description: description.into(),
            provider_states,
            outcome: InteractionOutcome::Errored { error },
            status: CheckReport::default(),
            headers: CheckReport::default(),
            body: CheckReport::default(),
        }
    }

    /// Report built from the three evaluator passes.
    #[must_use]
    pub fn checked(
        description: impl Into<String>,
        provider_states: Vec<String>,
        status: CheckReport,
        headers: CheckReport,
        body: CheckReport,
    ) -> Self {
        let outcome = if status.passed() && headers.passed() && body.passed() {
            InteractionOutcome::Passed
        } else {
            InteractionOutcome::Failed
        };
        Self {
            description: description.into(),
            provider_states,
            outcome,
            status,
            headers,
            body,
        }
    }

    /// Whether the interaction passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, InteractionOutcome::Passed)
    }

    /// The error, if the interaction could not be verified.
    #[must_use]
    pub const fn error(&self) -> Option<&InteractionError> {
        match &self.outcome {
            InteractionOutcome::Errored { error } => Some(error),
            _ => None,
        }
    }

    /// Every failed location across all passes.
    pub fn failures(&self) -> impl Iterator<Item = &FieldResult> {
        self.status
            .failures()
            .chain(self.headers.failures())
            .chain(self.body.failures())
    }

    /// One line, e.g. ``status ok, headers ok, body mismatch at `$.items[1].id` ``.
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.outcome {
            InteractionOutcome::Errored { error } => format!("error: {error}"),
            _ => format!(
                "{}, {}, {}",
                self.status.describe("status"),
                self.headers.describe("headers"),
                self.body.describe("body")
            ),
        }
    }
}

impl fmt::Display for InteractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description, self.summary())
    }
}

/// How a message verification ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Contents and metadata matched
    Passed,
    /// Something did not match
    Failed,
    /// The producer failed
    Errored {
        /// Producer error message
        reason: String,
    },
    /// No message producer is configured
    Unverified,
}

/// The verification of one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReport {
    /// Message description
    pub description: String,
    /// Overall outcome
    #[serde(flatten)]
    pub outcome: MessageOutcome,
    /// Contents pass
    pub contents: CheckReport,
    /// Metadata pass
    pub metadata: CheckReport,
}

impl MessageReport {
    /// Report for a message that was not verified.
    #[must_use]
    pub fn unverified(description: impl Into<String>) -> Self {
        Self::with_outcome(description, MessageOutcome::Unverified)
    }

    /// Report for a message whose producer failed.
    #[must_use]
    pub fn errored(description: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::with_outcome(
            description,
            MessageOutcome::Errored {
                reason: reason.into(),
            },
        )
    }

    fn with_outcome(description: impl Into<String>, outcome: MessageOutcome) -> Self {
        Self {
            description: description.into(),
            outcome,
            contents: CheckReport::default(),
            metadata: CheckReport::default(),
        }
    }

    /// Report built from the contents and metadata passes.
    #[must_use]
    pub fn checked(description: impl Into<String>, contents: CheckReport, metadata: CheckReport) -> Self {
        let outcome = if contents.passed() && metadata.passed() {
            MessageOutcome::Passed
        } else {
            MessageOutcome::Failed
        };
        Self {
            description: description.into(),
            outcome,
            contents,
            metadata,
        }
    }

    /// Whether the message passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, MessageOutcome::Passed)
    }

    /// One line, e.g. `contents ok, metadata ok`.
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.outcome {
            MessageOutcome::Unverified => "unverified: no message producer configured".to_string(),
            MessageOutcome::Errored { reason } => format!("error: {reason}"),
            _ => format!(
                "{}, {}",
                self.contents.describe("contents"),
                self.metadata.describe("metadata")
            ),
        }
    }
}

/// Counts over a whole document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerificationSummary {
    /// Interactions and messages that passed
    pub passed: usize,
    /// Interactions and messages that failed or errored
    pub failed: usize,
    /// Interactions that errored (included in `failed`)
    pub errored: usize,
    /// Messages not verified
    pub unverified: usize,
    /// Interactions plus messages
    pub total: usize,
}

impl VerificationSummary {
    /// Whether nothing failed. Unverified messages do not count as failures.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for VerificationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} total",
            self.passed, self.failed, self.total
        )?;
        if self.unverified > 0 {
            write!(f, ", {} unverified", self.unverified)?;
        }
        Ok(())
    }
}

/// The verification of a whole contract document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    /// Consumer name
    pub consumer: String,
    /// Provider name
    pub provider: String,
    /// When verification finished
    pub verified_at: DateTime<Utc>,
    /// Interaction reports, in declaration order
    pub interactions: Vec<InteractionReport>,
    /// Message reports, in declaration order
    pub messages: Vec<MessageReport>,
}

impl DocumentReport {
    /// Pass/fail counts.
    #[must_use]
    pub fn summary(&self) -> VerificationSummary {
        let mut summary = VerificationSummary {
            total: self.interactions.len() + self.messages.len(),
            ..VerificationSummary::default()
        };
        for interaction in &self.interactions {
            match interaction.outcome {
                InteractionOutcome::Passed => summary.passed += 1,
                InteractionOutcome::Failed => summary.failed += 1,
                InteractionOutcome::Errored { .. } => {
                    summary.failed += 1;
                    summary.errored += 1;
                }
            }
        }
        for message in &self.messages {
            match message.outcome {
                MessageOutcome::Passed => summary.passed += 1,
                MessageOutcome::Failed | MessageOutcome::Errored { .. } => summary.failed += 1,
                MessageOutcome::Unverified => summary.unverified += 1,
            }
        }
        summary
    }

    /// Whether nothing failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.summary().success()
    }
}
