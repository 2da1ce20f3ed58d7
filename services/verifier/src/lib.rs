//! Contract verifier service.
//!
//! Loads a consumer contract, replays it against a running provider and
//! reports the outcome on stdout, with optional Prometheus textfile metrics.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod render;

pub use config::{Config, ReportFormat};
pub use error::ServiceError;
pub use metrics::VerificationMetrics;

use pact_verifier::{ContractDocument, DocumentReport, HttpProviderInvoker, Verifier, VerifierConfig};
use std::sync::Arc;
use tracing::{info, warn};

/// Verify the configured contract against the configured provider.
///
/// A report is returned whether or not verification passed; errors mean the
/// run could not start or its metrics could not be written.
///
/// # Errors
///
/// Returns an error if the contract cannot be loaded, the provider URL is
/// invalid, or the metrics file cannot be written.
pub async fn run(config: &Config) -> Result<DocumentReport, ServiceError> {
    let document = ContractDocument::from_path(&config.pact_file)?;
    info!(
        consumer = %document.consumer.name,
        provider = %document.provider.name,
        interactions = document.interactions.len(),
        messages = document.messages.len(),
        "Loaded contract from {}",
        config.pact_file.display()
    );

    let invoker = HttpProviderInvoker::new(&config.provider_base_url, &config.http)?;
    let verifier = Verifier::new(
        Arc::new(invoker),
        VerifierConfig::default()
            .with_timeout(config.timeout)
            .with_max_concurrency(config.concurrency),
    );
    let report = verifier.verify_document(&document).await;

    let summary = report.summary();
    if summary.success() {
        info!(%summary, "Verification passed");
    } else {
        warn!(%summary, "Verification failed");
    }

    if let Some(path) = &config.metrics_file {
        VerificationMetrics::from_report(&report).write_to(path).await?;
        info!("Wrote metrics to {}", path.display());
    }
    Ok(report)
}
