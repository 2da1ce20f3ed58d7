//! Shared library for cross-cutting concerns in the contract verifier.
//!
//! This crate provides centralized implementations for:
//! - Transport error types shared by provider invokers
//! - HTTP client configuration and building
//! - Tracing subscriber setup
//! - Prometheus text metrics helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod metrics;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, build_http_client};
pub use metrics::{Counter, Gauge};
pub use tracing_config::{TracingConfig, init_tracing};
