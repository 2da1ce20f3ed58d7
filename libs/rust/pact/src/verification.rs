//! Interaction and document verification.
//!
//! A [`Verifier`] builds the outbound request for each interaction, calls
//! the provider once through a [`ProviderInvoker`], and runs three evaluator
//! passes over the answer: status, headers and body. Every failure is
//! captured into that interaction's report; nothing aborts the document.

use crate::contract::{ContractDocument, Interaction, Message, Response};
use crate::error::InteractionError;
use crate::matching::{CompiledRules, FieldResult, RuleIndex, evaluate};
use crate::message::MessageProducer;
use crate::path::DocPath;
use crate::provider::{ProviderInvoker, ProviderRequest, ProviderResponse};
use crate::report::{CheckReport, DocumentReport, InteractionReport, MessageReport};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use rust_common::PlatformError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Verifier configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Upper bound for one provider call (default: 30s)
    pub timeout: Duration,
    /// Provider calls in flight at once (default: 1, sequential)
    pub max_concurrency: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_concurrency: 1,
        }
    }
}

impl VerifierConfig {
    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many provider calls may be in flight; at least one.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }
}

/// Verifies contract documents against one provider.
#[derive(Clone)]
pub struct Verifier {
    invoker: Arc<dyn ProviderInvoker>,
    producer: Option<Arc<dyn MessageProducer>>,
    config: VerifierConfig,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("config", &self.config)
            .field("message_producer", &self.producer.is_some())
            .finish_non_exhaustive()
    }
}

impl Verifier {
    /// Create a verifier calling the provider through `invoker`.
    #[must_use]
    pub fn new(invoker: Arc<dyn ProviderInvoker>, config: VerifierConfig) -> Self {
        Self {
            invoker,
            producer: None,
            config,
        }
    }

    /// Verify messages with `producer`; without one they are reported unverified.
    #[must_use]
    pub fn with_message_producer(mut self, producer: Arc<dyn MessageProducer>) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify one interaction. The provider is called at most once.
    ///
    /// Provider-state setup is the caller's job; the report lists the
    /// state names.
    #[instrument(skip(self, interaction), fields(interaction = %interaction.description))]
    pub async fn verify_interaction(&self, interaction: &Interaction) -> InteractionReport {
        let states = interaction.state_names();
        let location = format!("interaction '{}' response", interaction.description);

        let rules = match CompiledRules::compile(&interaction.response.matching_rules, &location) {
            Ok(rules) => rules,
            Err(err) => {
                let error = InteractionError::MalformedRule {
                    reason: err.to_string(),
                };
                warn!(error = %error, "Interaction rules do not compile");
                return InteractionReport::errored(&interaction.description, states, error);
            }
        };

        let request = match ProviderRequest::from_contract(&interaction.request) {
            Ok(request) => request,
            Err(error) => {
                warn!(error = %error, "Interaction request could not be built");
                return InteractionReport::errored(&interaction.description, states, error);
            }
        };

        let response = match self.invoke(&request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, method = %request.method, path = %request.path, "Provider call failed");
                return InteractionReport::errored(&interaction.description, states, error);
            }
        };

        let report = InteractionReport::checked(
            &interaction.description,
            states,
            check_status(&interaction.response, &rules.status, &response),
            check_headers(&interaction.response, &rules.header, &response),
            check_body(&interaction.response, &rules.body, &response),
        );
        info!(passed = report.passed(), summary = %report.summary(), "Interaction verified");
        report
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse, InteractionError> {
        let timeout = self.config.timeout;
        let timed_out = || InteractionError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        };

        match tokio::time::timeout(timeout, self.invoker.invoke(request, timeout)).await {
            Err(_) => Err(timed_out()),
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) if err.is_timeout() => Err(timed_out()),
            Ok(Err(PlatformError::InvalidInput(reason))) => Err(InteractionError::InvalidRequest { reason }),
            Ok(Err(err)) => Err(InteractionError::ProviderUnreachable {
                reason: err.to_string(),
            }),
        }
    }

    /// Verify one message through the configured producer.
    #[instrument(skip(self, message), fields(description = %message.description))]
    pub async fn verify_message(&self, message: &Message) -> MessageReport {
        let Some(producer) = &self.producer else {
            warn!("No message producer configured, message left unverified");
            return MessageReport::unverified(&message.description);
        };

        let location = format!("message '{}'", message.description);
        let rules = match CompiledRules::compile(&message.matching_rules, &location) {
            Ok(rules) => rules,
            Err(err) => return MessageReport::errored(&message.description, err.to_string()),
        };

        let produced = match tokio::time::timeout(self.config.timeout, producer.produce(message)).await {
            Ok(Ok(produced)) => produced,
            Ok(Err(err)) => {
                warn!(error = %err, "Message producer failed");
                return MessageReport::errored(&message.description, err.to_string());
            }
            Err(_) => {
                warn!("Message producer timed out");
                return MessageReport::errored(
                    &message.description,
                    format!("producer did not respond within {}ms", self.config.timeout.as_millis()),
                );
            }
        };

        let contents = match &message.contents {
            None => CheckReport::default(),
            Some(expected) => CheckReport::new(evaluate(expected, &produced.contents, &rules.body)),
        };
        let metadata = CheckReport::new(evaluate(
            &object(&message.metadata),
            &object(&produced.metadata),
            &rules.metadata,
        ));

        let report = MessageReport::checked(&message.description, contents, metadata);
        info!(passed = report.passed(), summary = %report.summary(), "Message verified");
        report
    }

    /// Verify every interaction and message of a document.
    ///
    /// Reports keep declaration order regardless of concurrency.
    #[instrument(
        skip(self, document),
        fields(consumer = %document.consumer.name, provider = %document.provider.name)
    )]
    pub async fn verify_document(&self, document: &ContractDocument) -> DocumentReport {
        let concurrency = self.config.max_concurrency.max(1);
        info!(
            interactions = document.interactions.len(),
            messages = document.messages.len(),
            concurrency,
            "Verifying contract"
        );

        let interactions: Vec<InteractionReport> = stream::iter(&document.interactions)
            .map(|interaction| self.verify_interaction(interaction))
            .buffered(concurrency)
            .collect()
            .await;
        let messages: Vec<MessageReport> = stream::iter(&document.messages)
            .map(|message| self.verify_message(message))
            .buffered(concurrency)
            .collect()
            .await;

        let report = DocumentReport {
            consumer: document.consumer.name.clone(),
            provider: document.provider.name.clone(),
            verified_at: Utc::now(),
            interactions,
            messages,
        };
        info!(summary = %report.summary(), "Contract verified");
        report
    }
}

fn check_status(expected: &Response, rules: &RuleIndex, actual: &ProviderResponse) -> CheckReport {
    let results = evaluate(
        &Value::from(expected.status),
        &Value::from(actual.status),
        rules,
    );
    debug!(results = results.len(), "Status evaluated");
    CheckReport::new(results)
}

/// Header names compare case-insensitively and values are trimmed; extra
/// actual headers are ignored.
fn check_headers(expected: &Response, rules: &RuleIndex, actual: &ProviderResponse) -> CheckReport {
    let normalize = |headers: &BTreeMap<String, String>| -> Value {
        Value::Object(
            headers
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), Value::from(value.trim())))
                .collect(),
        )
    };
    let results = evaluate(&normalize(&expected.headers), &normalize(&actual.headers), rules);
    debug!(results = results.len(), "Headers evaluated");
    CheckReport::new(results)
}

/// An absent expected body accepts anything; an expected body against an
/// empty actual one is a single missing result at `$`.
fn check_body(expected: &Response, rules: &RuleIndex, actual: &ProviderResponse) -> CheckReport {
    let Some(expected_body) = &expected.body else {
        return CheckReport::default();
    };
    let results = match actual.body_value() {
        None => vec![FieldResult::missing(
            &DocPath::root(),
            expected_body,
            "response body is empty",
        )],
        Some(actual_body) => evaluate(expected_body, &actual_body, rules),
    };
    debug!(results = results.len(), "Body evaluated");
    CheckReport::new(results)
}

fn object(entries: &BTreeMap<String, Value>) -> Value {
    Value::Object(entries.iter().map(|(key, value)| (key.clone(), value.clone())).collect::<Map<_, _>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Request;
    use crate::matching::MismatchKind;
    use crate::message::ProducedMessage;
    use crate::report::{InteractionOutcome, MessageOutcome};
    use crate::rules::{Matcher, MatchingRule};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every request with the same response and counts calls.
    struct Fixed {
        response: Result<ProviderResponse, fn() -> PlatformError>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn ok(response: ProviderResponse) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(response),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(error: fn() -> PlatformError) -> Arc<Self> {
            Arc::new(Self {
                response: Err(error),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ProviderInvoker for Fixed {
        async fn invoke(
            &self,
            _request: &ProviderRequest,
            _timeout: Duration,
        ) -> Result<ProviderResponse, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.response.clone().map_err(|error| error())
        }
    }

    struct Echo(Mutex<Vec<String>>);

    #[async_trait]
    impl MessageProducer for Echo {
        async fn produce(&self, message: &Message) -> Result<ProducedMessage, PlatformError> {
            self.0.lock().unwrap().push(message.description.clone());
            Ok(ProducedMessage::new(json!({"id": 77, "kind": "created"}))
                .with_metadata("contentType", json!("application/json")))
        }
    }

    fn users_interaction() -> Interaction {
        let mut response = Response::with_status(200);
        response.body = Some(json!([{"id": 1, "name": "x"}]));
        response
            .matching_rules
            .body
            .insert("$[*].id".to_string(), MatchingRule::single(Matcher::of_type()));
        Interaction {
            description: "get users".to_string(),
            provider_states: Vec::new(),
            request: Request::new("GET", "/users"),
            response,
        }
    }

    fn verifier(invoker: Arc<Fixed>) -> Verifier {
        Verifier::new(invoker, VerifierConfig::default().with_timeout(Duration::from_millis(200)))
    }

    #[tokio::test]
    async fn test_literal_name_mismatch_fails() {
        let invoker = Fixed::ok(
            ProviderResponse::new(200).with_json(&json!([{"id": 8_958_464_620_u64, "name": "Rogger"}])),
        );
        let report = verifier(Arc::clone(&invoker)).verify_interaction(&users_interaction()).await;

        assert_eq!(report.outcome, InteractionOutcome::Failed);
        assert!(report.status.passed());
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "$[0].name");
        assert_eq!(report.summary(), "status ok, headers ok, body mismatch at `$[0].name`");
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_type_matched_id_passes() {
        let invoker = Fixed::ok(ProviderResponse::new(200).with_json(&json!([
            {"id": 8_958_464_620_u64, "name": "x"},
            {"id": 4_143_398_442_u64, "name": "y"}
        ])));
        let mut interaction = users_interaction();
        interaction
            .response
            .matching_rules
            .body
            .insert("$".to_string(), MatchingRule::single(Matcher::of_type()));

        let report = verifier(invoker).verify_interaction(&interaction).await;
        assert!(report.passed(), "{}", report.summary());
    }

    #[tokio::test]
    async fn test_status_mismatch() {
        let invoker = Fixed::ok(ProviderResponse::new(404));
        let mut interaction = users_interaction();
        interaction.response.body = None;

        let report = verifier(invoker).verify_interaction(&interaction).await;
        assert!(!report.status.passed());
        assert!(report.body.passed());
    }

    #[tokio::test]
    async fn test_status_rule() {
        let invoker = Fixed::ok(ProviderResponse::new(201));
        let mut interaction = users_interaction();
        interaction.response.body = None;
        interaction.response.matching_rules.status = Some(MatchingRule::single(Matcher::regex("2\\d\\d")));

        assert!(verifier(invoker).verify_interaction(&interaction).await.passed());
    }

    #[tokio::test]
    async fn test_headers_case_insensitive_and_trimmed() {
        let invoker = Fixed::ok(
            ProviderResponse::new(200)
                .with_header("X-Request-Id", " abc ")
                .with_header("X-Extra", "ignored"),
        );
        let mut interaction = users_interaction();
        interaction.response.body = None;
        interaction
            .response
            .headers
            .insert("x-REQUEST-id".to_string(), "abc".to_string());

        let report = verifier(invoker).verify_interaction(&interaction).await;
        assert!(report.passed(), "{}", report.summary());
    }

    #[tokio::test]
    async fn test_missing_header() {
        let invoker = Fixed::ok(ProviderResponse::new(200));
        let mut interaction = users_interaction();
        interaction.response.body = None;
        interaction
            .response
            .headers
            .insert("ETag".to_string(), "v1".to_string());

        let report = verifier(invoker).verify_interaction(&interaction).await;
        let failure = report.headers.failures().next().unwrap();
        assert_eq!(failure.path, "$.etag");
        assert_eq!(failure.mismatch.as_ref().unwrap().kind, MismatchKind::FieldMissing);
    }

    #[tokio::test]
    async fn test_absent_expected_body_passes_anything() {
        let invoker = Fixed::ok(ProviderResponse::new(200).with_body("<html>"));
        let mut interaction = users_interaction();
        interaction.response.body = None;
        assert!(verifier(invoker).verify_interaction(&interaction).await.passed());
    }

    #[tokio::test]
    async fn test_empty_actual_body_is_missing() {
        let invoker = Fixed::ok(ProviderResponse::new(200));
        let report = verifier(invoker).verify_interaction(&users_interaction()).await;
        let failure = report.body.failures().next().unwrap();
        assert_eq!(failure.path, "$");
        assert_eq!(failure.mismatch.as_ref().unwrap().kind, MismatchKind::FieldMissing);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let invoker = Arc::new(Fixed {
            response: Ok(ProviderResponse::new(200)),
            delay: Duration::from_secs(5),
            calls: AtomicUsize::new(0),
        });
        let verifier = Verifier::new(invoker, VerifierConfig::default().with_timeout(Duration::from_millis(20)));
        let report = verifier.verify_interaction(&users_interaction()).await;
        assert_eq!(report.error(), Some(&InteractionError::Timeout { timeout_ms: 20 }));
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let invoker = Fixed::failing(|| PlatformError::unavailable("connection refused"));
        let report = verifier(invoker).verify_interaction(&users_interaction()).await;
        assert!(matches!(report.error(), Some(InteractionError::ProviderUnreachable { .. })));

        let invoker = Fixed::failing(|| PlatformError::timeout("deadline"));
        let report = verifier(invoker).verify_interaction(&users_interaction()).await;
        assert!(matches!(report.error(), Some(InteractionError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_malformed_rule_skips_provider() {
        let invoker = Fixed::ok(ProviderResponse::new(200));
        let mut interaction = users_interaction();
        interaction
            .response
            .matching_rules
            .body
            .insert("$..".to_string(), MatchingRule::single(Matcher::of_type()));

        let report = verifier(Arc::clone(&invoker)).verify_interaction(&interaction).await;
        assert!(matches!(report.error(), Some(InteractionError::MalformedRule { .. })));
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_messages_without_producer_are_unverified() {
        let document = ContractDocument {
            provider: crate::contract::Participant::new("p"),
            consumer: crate::contract::Participant::new("c"),
            messages: vec![Message {
                description: "user created".to_string(),
                contents: Some(json!({"id": 1})),
                ..Message::default()
            }],
            ..ContractDocument::default()
        };
        let report = verifier(Fixed::ok(ProviderResponse::new(200)))
            .verify_document(&document)
            .await;
        assert_eq!(report.messages[0].outcome, MessageOutcome::Unverified);
        assert!(report.passed());
        assert_eq!(report.summary().unverified, 1);
    }

    #[tokio::test]
    async fn test_message_with_producer() {
        let producer = Arc::new(Echo(Mutex::new(Vec::new())));
        let verifier = verifier(Fixed::ok(ProviderResponse::new(200)))
            .with_message_producer(Arc::clone(&producer) as Arc<dyn MessageProducer>);

        let mut message = Message {
            description: "user created".to_string(),
            contents: Some(json!({"id": 1, "kind": "created"})),
            ..Message::default()
        };
        message
            .metadata
            .insert("contentType".to_string(), json!("application/json"));
        message
            .matching_rules
            .body
            .insert("$.id".to_string(), MatchingRule::single(Matcher::Integer));

        let report = verifier.verify_message(&message).await;
        assert!(report.passed(), "{}", report.summary());
        assert_eq!(producer.0.lock().unwrap().as_slice(), ["user created".to_string()]);

        message.contents = Some(json!({"id": 1, "kind": "deleted"}));
        let report = verifier.verify_message(&message).await;
        assert_eq!(report.outcome, MessageOutcome::Failed);
    }

    #[test]
    fn test_document_with_no_interactions_passes() {
        let document = ContractDocument {
            consumer: crate::contract::Participant::new("web-app"),
            provider: crate::contract::Participant::new("user-service"),
            ..ContractDocument::default()
        };
        let invoker = Fixed::ok(ProviderResponse::new(200));
        let report = tokio_test::block_on(verifier(Arc::clone(&invoker)).verify_document(&document));

        assert!(report.passed());
        assert_eq!(report.consumer, "web-app");
        assert_eq!(report.summary().total, 0);
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    }
}
