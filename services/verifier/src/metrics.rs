//! Prometheus metrics for the verifier.
//!
//! Collected once per run and written as a textfile for node-exporter.

use pact_verifier::{DocumentReport, InteractionOutcome, MessageOutcome};
use rust_common::{Counter, Gauge};
use std::path::Path;

/// Counters for one verified contract document.
#[derive(Debug)]
pub struct VerificationMetrics {
    interactions_passed: Counter,
    interactions_failed: Counter,
    interactions_errored: Counter,
    messages_verified: Counter,
    messages_unverified: Gauge,
    last_run_success: Gauge,
}

impl VerificationMetrics {
    /// Create metrics labelled with the contract participants.
    #[must_use]
    pub fn new(consumer: &str, provider: &str) -> Self {
        let labelled_counter = |name: &str, help: &str| {
            Counter::new(name, help)
                .with_label("consumer", consumer)
                .with_label("provider", provider)
        };
        let labelled_gauge = |name: &str, help: &str| {
            Gauge::new(name, help)
                .with_label("consumer", consumer)
                .with_label("provider", provider)
        };
        Self {
            interactions_passed: labelled_counter(
                "contract_verifier_interactions_passed_total",
                "Interactions whose response matched the contract",
            ),
            interactions_failed: labelled_counter(
                "contract_verifier_interactions_failed_total",
                "Interactions whose response did not match the contract",
            ),
            interactions_errored: labelled_counter(
                "contract_verifier_interactions_errored_total",
                "Interactions that could not be verified",
            ),
            messages_verified: labelled_counter(
                "contract_verifier_messages_verified_total",
                "Messages checked against a produced message",
            ),
            messages_unverified: labelled_gauge(
                "contract_verifier_messages_unverified",
                "Messages skipped because no producer is configured",
            ),
            last_run_success: labelled_gauge(
                "contract_verifier_last_run_success",
                "1 if the last verification run passed, 0 otherwise",
            ),
        }
    }

    /// Metrics for a finished report.
    #[must_use]
    pub fn from_report(report: &DocumentReport) -> Self {
        let metrics = Self::new(&report.consumer, &report.provider);
        metrics.record(report);
        metrics
    }

    /// Count every interaction and message of a report.
    pub fn record(&self, report: &DocumentReport) {
        for interaction in &report.interactions {
            match interaction.outcome {
                InteractionOutcome::Passed => self.interactions_passed.inc(),
                InteractionOutcome::Failed => self.interactions_failed.inc(),
                InteractionOutcome::Errored { .. } => self.interactions_errored.inc(),
            }
        }
        let mut unverified = 0;
        for message in &report.messages {
            match message.outcome {
                MessageOutcome::Unverified => unverified += 1,
                _ => self.messages_verified.inc(),
            }
        }
        self.messages_unverified.set(unverified);
        self.last_run_success.set(u64::from(report.passed()));
    }

    /// Number of interactions that did not pass.
    #[must_use]
    pub fn interactions_not_passed(&self) -> u64 {
        self.interactions_failed.get() + self.interactions_errored.get()
    }

    /// Render all metrics as Prometheus text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        [
            self.interactions_passed.to_prometheus(),
            self.interactions_failed.to_prometheus(),
            self.interactions_errored.to_prometheus(),
            self.messages_verified.to_prometheus(),
            self.messages_unverified.to_prometheus(),
            self.last_run_success.to_prometheus(),
        ]
        .concat()
    }

    /// Write the Prometheus text to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_to(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, self.to_prometheus()).await
    }
}
