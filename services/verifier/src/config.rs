//! Centralized configuration for the verifier service.
//!
//! All configuration is loaded from environment variables (and an optional
//! `.env` file) and validated at startup. The contract file may also be
//! given as the first command-line argument.

use crate::error::ServiceError;
use rust_common::{HttpConfig, TracingConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// How the final report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

impl FromStr for ReportFormat {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ServiceError::config(format!("Invalid REPORT_FORMAT: {other}"))),
        }
    }
}

/// Verifier service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Contract document to verify
    pub pact_file: PathBuf,
    /// Provider base URL, e.g. `http://localhost:8080`
    pub provider_base_url: String,
    /// Timeout per provider call
    pub timeout: Duration,
    /// Provider calls in flight at once
    pub concurrency: usize,
    /// Report output format
    pub report_format: ReportFormat,
    /// Where to write Prometheus text metrics, if anywhere
    pub metrics_file: Option<PathBuf>,
    /// Log setup
    pub tracing: TracingConfig,
    /// HTTP client setup
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from the process environment and arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(env::args().nth(1), |name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_lookup(
        first_arg: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ServiceError> {
        let pact_file = first_arg
            .or_else(|| lookup("PACT_FILE"))
            .filter(|file| !file.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ServiceError::config("PACT_FILE is not set and no contract file was given"))?;

        let provider_base_url = lookup("PROVIDER_BASE_URL").unwrap_or_else(|| "http://localhost:8080".to_string());
        let timeout = Duration::from_secs(parse_env(&lookup, "VERIFY_TIMEOUT_SECS", 30)?);
        if timeout.is_zero() {
            return Err(ServiceError::config("VERIFY_TIMEOUT_SECS must be positive"));
        }
        let concurrency = parse_env(&lookup, "VERIFY_CONCURRENCY", 1_usize)?;
        if concurrency == 0 {
            return Err(ServiceError::config("VERIFY_CONCURRENCY must be at least 1"));
        }
        let report_format = parse_env(&lookup, "REPORT_FORMAT", ReportFormat::Text)?;
        let metrics_file = lookup("METRICS_FILE")
            .filter(|file| !file.trim().is_empty())
            .map(PathBuf::from);

        let tracing = TracingConfig::default()
            .with_service_name("contract-verifier")
            .with_log_level(lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()))
            .with_json_output(parse_env(&lookup, "LOG_JSON", false)?);

        let http = HttpConfig::default().with_timeout(timeout);

        Ok(Self {
            pact_file,
            provider_base_url,
            timeout,
            concurrency,
            report_format,
            metrics_file,
            tracing,
            http,
        })
    }
}

/// Parse a variable with a default value.
fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ServiceError>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .parse()
            .map_err(|e| ServiceError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}
