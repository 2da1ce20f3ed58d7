//! Report rendering for the console.

use crate::config::ReportFormat;
use crate::error::ServiceError;
use pact_verifier::{DocumentReport, FieldResult, InteractionReport, MessageOutcome, MessageReport};
use std::fmt::Write as _;

/// Render a document report in the configured format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(report: &DocumentReport, format: ReportFormat) -> Result<String, ServiceError> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Human-readable report: one block per interaction and message, then the counts.
#[must_use]
pub fn render_text(report: &DocumentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Verifying a pact between {} and {}",
        report.consumer, report.provider
    );
    for interaction in &report.interactions {
        write_interaction(&mut out, interaction);
    }
    if !report.messages.is_empty() {
        let _ = writeln!(out, "Messages:");
        for message in &report.messages {
            write_message(&mut out, message);
        }
    }
    let _ = writeln!(out, "Summary: {}", report.summary());
    out
}

fn write_interaction(out: &mut String, interaction: &InteractionReport) {
    let _ = write!(out, "  {}", interaction.description);
    if !interaction.provider_states.is_empty() {
        let _ = write!(out, " (given {})", interaction.provider_states.join(", "));
    }
    let verdict = if interaction.passed() {
        "PASS"
    } else if interaction.error().is_some() {
        "ERROR"
    } else {
        "FAIL"
    };
    let _ = writeln!(out, "\n    {verdict} {}", interaction.summary());
    write_failures(out, interaction.failures());
}

fn write_message(out: &mut String, message: &MessageReport) {
    let verdict = match message.outcome {
        MessageOutcome::Passed => "PASS",
        MessageOutcome::Failed => "FAIL",
        MessageOutcome::Errored { .. } => "ERROR",
        MessageOutcome::Unverified => "SKIP",
    };
    let _ = writeln!(out, "  {}\n    {verdict} {}", message.description, message.summary());
    write_failures(out, message.contents.failures().chain(message.metadata.failures()));
}

fn write_failures<'a>(out: &mut String, failures: impl Iterator<Item = &'a FieldResult>) {
    for failure in failures {
        let _ = writeln!(out, "      {failure}");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pact_verifier::{CheckReport, InteractionError, Mismatch, MismatchKind};
    use serde_json::json;

    fn failed_body() -> CheckReport {
        CheckReport::new(vec![FieldResult {
            path: "$[0].name".to_string(),
            expected: json!("x"),
            actual: Some(json!("Rogger")),
            mismatch: Some(Mismatch {
                kind: MismatchKind::FieldMismatch,
                reason: "expected \"x\" but was \"Rogger\"".to_string(),
            }),
        }])
    }

    pub(crate) fn sample_report() -> DocumentReport {
        DocumentReport {
            consumer: "web-app".to_string(),
            provider: "user-service".to_string(),
            verified_at: chrono::Utc::now(),
            interactions: vec![
                InteractionReport::checked(
                    "a request for all users",
                    vec!["users exist".to_string()],
                    CheckReport::default(),
                    CheckReport::default(),
                    CheckReport::default(),
                ),
                InteractionReport::checked(
                    "a request with the wrong name",
                    Vec::new(),
                    CheckReport::default(),
                    CheckReport::default(),
                    failed_body(),
                ),
                InteractionReport::errored(
                    "a request to a slow provider",
                    Vec::new(),
                    InteractionError::Timeout { timeout_ms: 50 },
                ),
            ],
            messages: vec![MessageReport::unverified("a user created event")],
        }
    }

    #[test]
    fn test_text_report() {
        let text = render_text(&sample_report());
        assert!(text.starts_with("Verifying a pact between web-app and user-service\n"));
        assert!(text.contains("  a request for all users (given users exist)\n    PASS status ok, headers ok, body ok\n"));
        assert!(text.contains("    FAIL status ok, headers ok, body mismatch at `$[0].name`\n"));
        assert!(text.contains("      $[0].name: mismatch: expected \"x\" but was \"Rogger\"\n"));
        assert!(text.contains("    ERROR error: provider did not respond within 50ms\n"));
        assert!(text.contains("Messages:\n  a user created event\n    SKIP unverified"));
        assert!(text.ends_with("Summary: 1 passed, 2 failed, 4 total, 1 unverified\n"));
    }

    #[test]
    fn test_json_report() {
        let rendered = render(&sample_report(), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["consumer"], "web-app");
        assert_eq!(value["interactions"][1]["outcome"], "failed");
        assert_eq!(value["interactions"][2]["error"]["kind"], "timeout");
        assert_eq!(value["messages"][0]["outcome"], "unverified");
    }
}
