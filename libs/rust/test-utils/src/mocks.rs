//! Mock implementations for testing.
//!
//! [`MockProvider`] stands in for a provider service and
//! [`MockMessageProducer`] for the code that publishes messages.

use async_trait::async_trait;
use pact_verifier::{Message, MessageProducer, ProducedMessage, ProviderInvoker, ProviderRequest, ProviderResponse};
use rust_common::PlatformError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// What the mock provider does for one route.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Answer immediately
    Respond(ProviderResponse),
    /// Answer after a delay
    Delayed(Duration, ProviderResponse),
    /// Never answer within any reasonable timeout
    Hang,
    /// Fail as if the connection was refused
    Unreachable,
}

/// Mock provider invoker with scripted routes and call recording.
///
/// Routes are keyed by uppercased method and path. Unscripted routes
/// answer `404`.
#[derive(Debug, Default)]
pub struct MockProvider {
    routes: RwLock<HashMap<(String, String), MockBehavior>>,
    calls: RwLock<Vec<ProviderRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProvider {
    /// Create a mock without routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a route.
    pub async fn route(&self, method: &str, path: &str, behavior: MockBehavior) {
        self.routes
            .write()
            .await
            .insert((method.to_ascii_uppercase(), path.to_string()), behavior);
    }

    /// Script a route answering immediately.
    pub async fn respond(&self, method: &str, path: &str, response: ProviderResponse) {
        self.route(method, path, MockBehavior::Respond(response)).await;
    }

    /// Requests received so far, in arrival order.
    pub async fn calls(&self) -> Vec<ProviderRequest> {
        self.calls.read().await.clone()
    }

    /// Number of requests received.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Highest number of requests that were in flight at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self, request: &ProviderRequest) -> Result<ProviderResponse, PlatformError> {
        let behavior = self
            .routes
            .read()
            .await
            .get(&(request.method.clone(), request.path.clone()))
            .cloned();

        match behavior {
            None => Ok(ProviderResponse::new(404)),
            Some(MockBehavior::Respond(response)) => Ok(response),
            Some(MockBehavior::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(MockBehavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(PlatformError::timeout("mock provider hung"))
            }
            Some(MockBehavior::Unreachable) => Err(PlatformError::unavailable("connection refused")),
        }
    }
}

#[async_trait]
impl ProviderInvoker for MockProvider {
    async fn invoke(
        &self,
        request: &ProviderRequest,
        _timeout: Duration,
    ) -> Result<ProviderResponse, PlatformError> {
        self.calls.write().await.push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Decrements even when the verifier drops the call on timeout.
        let _guard = InFlight(&self.in_flight);
        self.answer(request).await
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock message producer answering by message description.
#[derive(Debug, Default)]
pub struct MockMessageProducer {
    messages: RwLock<HashMap<String, ProducedMessage>>,
    produced: RwLock<Vec<String>>,
}

impl MockMessageProducer {
    /// Create a producer without messages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the message produced for a description.
    pub async fn register(&self, description: &str, message: ProducedMessage) {
        self.messages
            .write()
            .await
            .insert(description.to_string(), message);
    }

    /// Descriptions produced so far.
    pub async fn produced(&self) -> Vec<String> {
        self.produced.read().await.clone()
    }
}

#[async_trait]
impl MessageProducer for MockMessageProducer {
    async fn produce(&self, message: &Message) -> Result<ProducedMessage, PlatformError> {
        self.produced.write().await.push(message.description.clone());
        self.messages
            .read()
            .await
            .get(&message.description)
            .cloned()
            .ok_or_else(|| PlatformError::internal(format!("no message registered for '{}'", message.description)))
    }
}
