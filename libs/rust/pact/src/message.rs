//! Message producer seam for asynchronous contracts.

use crate::contract::Message;
use async_trait::async_trait;
use rust_common::PlatformError;
use serde_json::Value;
use std::collections::BTreeMap;

/// A message as actually produced by the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProducedMessage {
    /// Payload
    pub contents: Value,
    /// Metadata, e.g. `contentType` or routing keys
    pub metadata: BTreeMap<String, Value>,
}

impl ProducedMessage {
    /// A message with the given payload and no metadata.
    #[must_use]
    pub fn new(contents: Value) -> Self {
        Self {
            contents,
            metadata: BTreeMap::new(),
        }
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Produces the provider's message for a contract message.
///
/// Implementations usually dispatch on the description or on provider state
/// names and call the code that would publish the message.
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Produce the message the contract describes.
    async fn produce(&self, message: &Message) -> Result<ProducedMessage, PlatformError>;
}
