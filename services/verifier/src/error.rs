//! Service error types.

use pact_verifier::ContractError;
use rust_common::PlatformError;
use thiserror::Error;

/// Errors that stop a verification run before any report exists.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The contract document could not be loaded
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The provider invoker could not be set up
    #[error("Provider setup failed: {0}")]
    Platform(#[from] PlatformError),

    /// The report could not be rendered
    #[error("Report rendering failed: {0}")]
    Render(#[from] serde_json::Error),

    /// Metrics could not be written
    #[error("Failed to write metrics: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
