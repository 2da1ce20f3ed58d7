//! End-to-end verification tests.
//!
//! HTTP tests run the verifier against a `wiremock` server through the real
//! `HttpProviderInvoker`; ordering and concurrency tests use the scripted
//! mock provider from `test-utils`.

use pact_verifier::{
    ContractDocument, HttpProviderInvoker, InteractionError, InteractionOutcome, MessageOutcome,
    MismatchKind, Verifier, VerifierConfig,
};
use rust_common::HttpConfig;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use test_utils::fixtures::{user_created_message, users_body, users_contract, users_response};
use test_utils::mocks::{MockBehavior, MockMessageProducer, MockProvider};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_verifier(server: &MockServer, timeout: Duration) -> Verifier {
    let invoker = HttpProviderInvoker::new(&server.uri(), &HttpConfig::default()).unwrap();
    Verifier::new(Arc::new(invoker), VerifierConfig::default().with_timeout(timeout))
}

async fn mount_users(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(users_body().to_string(), "application/json; charset=UTF-8"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

mod http_provider {
    use super::*;

    #[tokio::test]
    async fn test_users_contract_passes_against_http_provider() {
        let server = MockServer::start().await;
        mount_users(&server).await;

        let report = http_verifier(&server, Duration::from_secs(5))
            .verify_document(&users_contract())
            .await;

        for interaction in &report.interactions {
            assert!(interaction.passed(), "{interaction}");
        }
        assert_eq!(report.messages[0].outcome, MessageOutcome::Unverified);
        let summary = report.summary();
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.unverified, 1);
    }

    #[tokio::test]
    async fn test_literal_mismatch_against_http_provider() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 8_958_464_620_u64, "name": "Rogger"}])))
            .mount(&server)
            .await;

        let document = ContractDocument::from_json(
            r#"{
                "consumer": {"name": "web-app"},
                "provider": {"name": "user-service"},
                "interactions": [{
                    "description": "get users",
                    "request": {"method": "GET", "path": "/users"},
                    "response": {
                        "status": 200,
                        "body": [{"id": 1, "name": "x"}],
                        "matchingRules": {"body": {"$[*].id": {"matchers": [{"match": "type"}]}}}
                    }
                }]
            }"#,
        )
        .unwrap();

        let report = http_verifier(&server, Duration::from_secs(5))
            .verify_document(&document)
            .await;
        let interaction = &report.interactions[0];
        assert_eq!(interaction.outcome, InteractionOutcome::Failed);
        let failures: Vec<_> = interaction.failures().map(|failure| failure.path.clone()).collect();
        assert_eq!(failures, vec!["$[0].name".to_string()]);
    }

    #[tokio::test]
    async fn test_request_is_built_from_contract() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .and(query_param("notify", "true"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 42, "name": "Ada"})))
            .expect(1)
            .mount(&server)
            .await;

        let document = ContractDocument::from_json(
            r#"{
                "consumer": {"name": "web-app"},
                "provider": {"name": "user-service"},
                "interactions": [{
                    "description": "create a user",
                    "request": {
                        "method": "post",
                        "path": "/users",
                        "query": "notify=true",
                        "body": {"name": "Ada"}
                    },
                    "response": {
                        "status": 201,
                        "body": {"id": 1, "name": "Ada"},
                        "matchingRules": {"body": {"$.id": {"matchers": [{"match": "integer"}]}}}
                    }
                }]
            }"#,
        )
        .unwrap();

        let invoker = HttpProviderInvoker::new(&format!("{}/api", server.uri()), &HttpConfig::default()).unwrap();
        let verifier = Verifier::new(Arc::new(invoker), VerifierConfig::default());
        let report = verifier.verify_interaction(&document.interactions[0]).await;
        assert!(report.passed(), "{report}");
    }

    #[tokio::test]
    async fn test_slow_http_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/404"))
            .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let contract = users_contract();
        let report = http_verifier(&server, Duration::from_millis(100))
            .verify_interaction(&contract.interactions[1])
            .await;
        assert!(matches!(report.error(), Some(InteractionError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_http_provider() {
        // Nothing listens on the discard port.
        let invoker = HttpProviderInvoker::new("http://127.0.0.1:9", &HttpConfig::default()).unwrap();
        let verifier = Verifier::new(Arc::new(invoker), VerifierConfig::default().with_timeout(Duration::from_secs(5)));

        let contract = users_contract();
        let report = verifier.verify_interaction(&contract.interactions[1]).await;
        assert!(matches!(
            report.error(),
            Some(InteractionError::ProviderUnreachable { .. } | InteractionError::Timeout { .. })
        ));
    }
}

mod ordering {
    use super::*;

    fn three_interactions() -> ContractDocument {
        ContractDocument::from_json(
            r#"{
                "consumer": {"name": "web-app"},
                "provider": {"name": "user-service"},
                "interactions": [
                    {"description": "first", "request": {"method": "GET", "path": "/a"}, "response": {"status": 200}},
                    {"description": "second", "request": {"method": "GET", "path": "/b"}, "response": {"status": 200}},
                    {"description": "third", "request": {"method": "GET", "path": "/c"}, "response": {"status": 200}}
                ]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_timed_out_middle_interaction_keeps_order() {
        let provider = Arc::new(MockProvider::new());
        provider.respond("GET", "/a", pact_verifier::ProviderResponse::new(200)).await;
        provider.route("GET", "/b", MockBehavior::Hang).await;
        provider.respond("GET", "/c", pact_verifier::ProviderResponse::new(200)).await;

        let verifier = Verifier::new(
            Arc::clone(&provider) as Arc<dyn pact_verifier::ProviderInvoker>,
            VerifierConfig::default().with_timeout(Duration::from_millis(50)),
        );
        let report = verifier.verify_document(&three_interactions()).await;

        let descriptions: Vec<&str> = report
            .interactions
            .iter()
            .map(|interaction| interaction.description.as_str())
            .collect();
        assert_eq!(descriptions, ["first", "second", "third"]);
        assert!(report.interactions[0].passed());
        assert_eq!(
            report.interactions[1].error(),
            Some(&InteractionError::Timeout { timeout_ms: 50 })
        );
        assert!(report.interactions[2].passed());
        assert_eq!(provider.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded_and_order_preserved() {
        let provider = Arc::new(MockProvider::new());
        let slow = |status| MockBehavior::Delayed(Duration::from_millis(40), pact_verifier::ProviderResponse::new(status));
        provider.route("GET", "/a", slow(200)).await;
        provider.route("GET", "/b", slow(500)).await;
        provider.route("GET", "/c", slow(200)).await;

        let verifier = Verifier::new(
            Arc::clone(&provider) as Arc<dyn pact_verifier::ProviderInvoker>,
            VerifierConfig::default()
                .with_timeout(Duration::from_secs(5))
                .with_max_concurrency(2),
        );
        let report = verifier.verify_document(&three_interactions()).await;

        let outcomes: Vec<bool> = report.interactions.iter().map(|interaction| interaction.passed()).collect();
        assert_eq!(outcomes, [true, false, true]);
        assert_eq!(report.interactions[1].description, "second");
        assert!(provider.max_in_flight() <= 2);
        assert_eq!(provider.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_sequential_by_default() {
        let provider = Arc::new(MockProvider::new());
        for route in ["/a", "/b", "/c"] {
            provider
                .route("GET", route, MockBehavior::Delayed(Duration::from_millis(5), pact_verifier::ProviderResponse::new(200)))
                .await;
        }

        let verifier = Verifier::new(
            Arc::clone(&provider) as Arc<dyn pact_verifier::ProviderInvoker>,
            VerifierConfig::default(),
        );
        let report = verifier.verify_document(&three_interactions()).await;
        assert!(report.passed());
        assert_eq!(provider.max_in_flight(), 1);

        let paths: Vec<String> = provider.calls().await.into_iter().map(|call| call.path).collect();
        assert_eq!(paths, ["/a", "/b", "/c"]);
    }
}

mod messages {
    use super::*;

    #[tokio::test]
    async fn test_message_verified_with_producer() {
        let provider = Arc::new(MockProvider::new());
        provider.respond("GET", "/users", users_response()).await;
        provider.respond("GET", "/users/404", pact_verifier::ProviderResponse::new(404)).await;

        let producer = Arc::new(MockMessageProducer::new());
        producer.register("a user created event", user_created_message()).await;

        let verifier = Verifier::new(
            Arc::clone(&provider) as Arc<dyn pact_verifier::ProviderInvoker>,
            VerifierConfig::default(),
        )
        .with_message_producer(Arc::clone(&producer) as Arc<dyn pact_verifier::MessageProducer>);

        let report = verifier.verify_document(&users_contract()).await;
        assert!(report.passed(), "{}", report.summary());
        assert_eq!(report.messages[0].outcome, MessageOutcome::Passed);
        assert_eq!(producer.produced().await, ["a user created event".to_string()]);
    }

    #[tokio::test]
    async fn test_message_with_wrong_type_fails() {
        let provider = Arc::new(MockProvider::new());
        let producer = Arc::new(MockMessageProducer::new());
        producer
            .register(
                "a user created event",
                pact_verifier::ProducedMessage::new(json!({
                    "event": "user.created",
                    "user": {"id": "one", "name": "Rogger"}
                })),
            )
            .await;

        let verifier = Verifier::new(provider, VerifierConfig::default()).with_message_producer(producer);
        let contract = users_contract();
        let report = verifier.verify_message(&contract.messages[0]).await;

        assert_eq!(report.outcome, MessageOutcome::Failed);
        let failure = report.contents.failures().next().unwrap();
        assert_eq!(failure.path, "$.user.id");
        assert_eq!(failure.mismatch.as_ref().unwrap().kind, MismatchKind::FieldMismatch);
        let metadata = report.metadata.failures().next().unwrap();
        assert_eq!(metadata.path, "$.contentType");
    }
}

mod in_process {
    use super::*;
    use http::{Method, Request, Response, StatusCode};
    use pact_verifier::ServiceInvoker;
    use std::convert::Infallible;
    use tower::service_fn;

    /// A users router answering the way the running service does.
    async fn users_router(request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Infallible> {
        let response = match request.uri().path() {
            "/users" => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json; charset=UTF-8")
                .body(users_body().to_string().into_bytes()),
            _ => Response::builder().status(StatusCode::NOT_FOUND).body(Vec::new()),
        };
        Ok(response.unwrap())
    }

    fn in_process_verifier<S>(service: S) -> Verifier
    where
        ServiceInvoker<S>: pact_verifier::ProviderInvoker + 'static,
    {
        Verifier::new(Arc::new(ServiceInvoker::new(service)), VerifierConfig::default())
    }

    #[tokio::test]
    async fn test_users_contract_passes_against_router() {
        let report = in_process_verifier(service_fn(users_router))
            .verify_document(&users_contract())
            .await;

        for interaction in &report.interactions {
            assert!(interaction.passed(), "{interaction}");
        }
        assert_eq!(report.summary().passed, 2);
        assert!(report.passed());
    }

    #[tokio::test]
    async fn test_router_sees_contract_request() {
        let router = service_fn(|request: Request<Vec<u8>>| async move {
            let accepts_json = request
                .headers()
                .get("accept")
                .is_some_and(|value| value == "application/json");
            if request.method() == Method::GET && accepts_json {
                users_router(request).await
            } else {
                Ok(Response::builder()
                    .status(StatusCode::NOT_ACCEPTABLE)
                    .body(Vec::new())
                    .unwrap())
            }
        });

        let report = in_process_verifier(router).verify_document(&users_contract()).await;

        assert!(report.interactions[0].passed(), "{}", report.interactions[0]);
        let lookup = &report.interactions[1];
        assert_eq!(lookup.outcome, InteractionOutcome::Failed);
        assert_eq!(lookup.status.failures().count(), 1);
    }

    #[tokio::test]
    async fn test_router_with_wrong_body_fails() {
        let router = service_fn(|_: Request<Vec<u8>>| async {
            let body = json!([{"dob": "19 July", "id": "x", "name": "Rogger", "timestamp": "now"}]);
            Ok::<_, Infallible>(
                Response::builder()
                    .status(StatusCode::OK)
                    .header("Content-Type", "application/json")
                    .body(body.to_string().into_bytes())
                    .unwrap(),
            )
        });

        let report = in_process_verifier(router).verify_document(&users_contract()).await;

        let listing = &report.interactions[0];
        assert_eq!(listing.outcome, InteractionOutcome::Failed);
        let failed_paths: Vec<&str> = listing.body.failures().map(|failure| failure.path.as_str()).collect();
        assert_eq!(failed_paths, vec!["$[0].dob", "$[0].id", "$[0].timestamp"]);
    }
}
