//! Shared test utilities for the contract verifier crates.
//!
//! This crate provides:
//! - Proptest generators for JSON values and contract documents
//! - Mock provider invokers and message producers
//! - Test fixtures with sample contracts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
