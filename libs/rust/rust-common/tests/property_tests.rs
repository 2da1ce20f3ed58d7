//! Property-based tests for rust-common crate.

use proptest::prelude::*;
use rust_common::{Counter, Gauge, HttpConfig, PlatformError};
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Counters only go up, by exactly the amounts added.
    #[test]
    fn prop_counter_sums_increments(amounts in prop::collection::vec(0u64..1_000, 0..20)) {
        let counter = Counter::new("calls_total", "Calls");
        for amount in &amounts {
            counter.inc_by(*amount);
        }
        prop_assert_eq!(counter.get(), amounts.iter().sum::<u64>());
        let expected_line = format!("calls_total {}\n", counter.get());
        prop_assert!(counter.to_prometheus().ends_with(&expected_line));
    }

    /// A gauge reports the last value set.
    #[test]
    fn prop_gauge_keeps_last_value(values in prop::collection::vec(any::<u64>(), 1..10)) {
        let gauge = Gauge::new("pending", "Pending");
        for value in &values {
            gauge.set(*value);
        }
        prop_assert_eq!(Some(gauge.get()), values.last().copied());
    }

    /// Label values never break out of their quotes.
    #[test]
    fn prop_label_values_stay_quoted(value in ".{0,24}") {
        let output = Counter::new("runs_total", "Runs")
            .with_label("provider", value.as_str())
            .to_prometheus();
        let sample = output.lines().nth(2).unwrap_or_default();
        let prefix = "runs_total{provider=\"";
        let suffix = "\"} 0";
        prop_assert!(sample.starts_with(prefix));
        prop_assert!(sample.ends_with(suffix));
        prop_assert_eq!(output.lines().count(), 3);
    }

    /// Only timeouts classify as timeouts.
    #[test]
    fn prop_timeout_classification(msg in "[a-zA-Z0-9 /]{0,32}") {
        prop_assert!(PlatformError::timeout(msg.clone()).is_timeout());
        prop_assert!(!PlatformError::unavailable(msg.clone()).is_timeout());
        prop_assert!(!PlatformError::invalid_input(msg.clone()).is_timeout());
        prop_assert!(!PlatformError::internal(msg).is_timeout());
    }

    /// The request timeout set on the builder is kept.
    #[test]
    fn prop_http_timeout_roundtrip(secs in 1u64..600) {
        let config = HttpConfig::default().with_timeout(Duration::from_secs(secs));
        prop_assert_eq!(config.timeout, Duration::from_secs(secs));
    }
}
