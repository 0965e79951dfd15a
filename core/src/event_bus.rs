//! Event bus abstraction for publishing audit events.
//!
//! Ledgers never talk to the bus directly. They hand events to the
//! `EventEmitter` in `stockcart-runtime`, which publishes through this trait
//! off the request path.
//!
//! # Delivery
//!
//! - **Best-effort from the producer**: a publish failure is logged, never retried
//!   by the ledger and never surfaced to the caller
//! - **At-least-once from the broker**: subscribers may see duplicates
//! - **Ordered within partition**: records sharing a key (the SKU) keep publish order
//!
//! # Implementations
//!
//! - `InMemoryEventBus` in `stockcart-testing` - for tests
//! - `RedpandaEventBus` in `stockcart-redpanda` - Kafka-compatible production bus

use chrono::{DateTime, Utc};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to connect to the event bus
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to topics
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe
        topics: Vec<String>,
        /// The reason for failure
        reason: String,
    },

    /// Consumer group error
    #[error("Consumer group error: {0}")]
    ConsumerGroupError(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Generic error for other failures
    #[error("Event bus error: {0}")]
    Other(String),
}

/// One keyed record on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Partition key (decimal SKU)
    pub key: String,
    /// Encoded event body
    pub payload: Vec<u8>,
    /// Record timestamp, equal to the event timestamp
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Build a record.
    #[must_use]
    pub const fn new(key: String, payload: Vec<u8>, timestamp: DateTime<Utc>) -> Self {
        Self {
            key,
            payload,
            timestamp,
        }
    }
}

/// Stream of records from subscriptions.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventRecord, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Dyn Compatibility
///
/// Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the bus
/// can be shared as `Arc<dyn EventBus>` between the emitter worker and tests.
pub trait EventBus: Send + Sync {
    /// Publish a record to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the publish operation fails.
    fn publish(
        &self,
        topic: &str,
        record: &EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one or more topics and receive a stream of records.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if subscription fails.
    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;

    /// Wait up to `timeout` for buffered records to reach the broker.
    ///
    /// Called once on shutdown, after the emitter has drained. Buses without a
    /// local buffer keep the default no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::TransportError`] if buffered records could not be
    /// delivered in time.
    fn flush(&self, timeout: Duration) -> Result<(), EventBusError> {
        let _ = timeout;
        Ok(())
    }
}
