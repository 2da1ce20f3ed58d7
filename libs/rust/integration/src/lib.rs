//! Integration tests for the contract verifier live in `tests/`.

#![forbid(unsafe_code)]
