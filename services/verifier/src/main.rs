//! Contract verifier entry point.

use anyhow::Context;
use contract_verifier::{Config, render};
use rust_common::init_tracing;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("failed to load configuration")?;
    init_tracing(&config.tracing);

    info!(
        provider = %config.provider_base_url,
        timeout_secs = config.timeout.as_secs(),
        concurrency = config.concurrency,
        "Starting contract verification"
    );

    let report = contract_verifier::run(&config)
        .await
        .with_context(|| format!("failed to verify {}", config.pact_file.display()))?;
    println!("{}", render::render(&report, config.report_format)?);

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
