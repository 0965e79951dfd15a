//! Redpanda event bus for the stock and cart audit stream.
//!
//! This crate implements the [`EventBus`] trait from `stockcart-core` on top of
//! rdkafka, so it works against Redpanda or any other Kafka-compatible broker.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ Stock ledger │   │ Cart ledger  │
//! └──────┬───────┘   └──────┬───────┘
//!        │ commit           │ commit
//!        ▼                  ▼
//! ┌─────────────────────────────────┐
//! │ EventEmitter (fire-and-forget)  │
//! └────────────────┬────────────────┘
//!                  ▼
//! ┌─────────────────────────────────┐
//! │ Redpanda topic (key = SKU)      │
//! └────────────────┬────────────────┘
//!                  ▼
//!          ┌───────────────┐
//!          │ Audit consumer│
//!          └───────────────┘
//! ```
//!
//! # Delivery Semantics
//!
//! - **Producer**: a single send attempt per record; failures are reported to the
//!   emitter, which logs them
//! - **Consumer**: at-least-once with manual offset commits after the record has
//!   been handed to the subscriber
//! - **Ordering**: records are keyed by SKU, so events for one SKU stay in order
//!
//! # Example
//!
//! ```no_run
//! use stockcart_redpanda::RedpandaEventBus;
//! use stockcart_core::event_bus::{EventBus, EventRecord};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = RedpandaEventBus::new("localhost:9092")?;
//!
//! let record = EventRecord::new("1001".to_string(), b"{}".to_vec(), chrono::Utc::now());
//! bus.publish("ledger-events", &record).await?;
//!
//! let mut stream = bus.subscribe(&["ledger-events"]).await?;
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(record) => println!("Received key {}", record.key),
//!         Err(e) => eprintln!("Error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use stockcart_core::event_bus::{EventBus, EventBusError, EventRecord, EventStream};

const DEFAULT_ACKS: &str = "1";
const DEFAULT_COMPRESSION: &str = "none";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BUFFER_SIZE: usize = 1000;
const DEFAULT_OFFSET_RESET: &str = "latest";

/// Redpanda event bus.
///
/// Holds one producer for the lifetime of the service. Each call to
/// [`EventBus::subscribe`] creates its own consumer.
///
/// # Example
///
/// ```no_run
/// use stockcart_redpanda::RedpandaEventBus;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = RedpandaEventBus::builder()
///     .brokers("localhost:9092,localhost:9093")
///     .producer_acks("all")
///     .compression("lz4")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RedpandaEventBus {
    /// Kafka producer for publishing records
    producer: FutureProducer,
    /// Broker addresses (for creating consumers)
    brokers: String,
    /// Producer timeout
    timeout: Duration,
    /// Consumer group ID (if explicitly set)
    consumer_group: Option<String>,
    /// Record buffer size for subscribers
    buffer_size: usize,
    /// Auto offset reset policy
    auto_offset_reset: String,
}

impl RedpandaEventBus {
    /// Create a bus with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the producer cannot be created.
    pub fn new(brokers: &str) -> Result<Self, EventBusError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a new builder for configuring the bus.
    #[must_use]
    pub fn builder() -> RedpandaEventBusBuilder {
        RedpandaEventBusBuilder::default()
    }

    /// Get a reference to the brokers string.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    /// Consumer group used by [`EventBus::subscribe`] for `topics`.
    ///
    /// An explicit group wins; otherwise the name is derived from the sorted topics.
    #[must_use]
    pub fn consumer_group_for(&self, topics: &[String]) -> String {
        self.consumer_group.clone().unwrap_or_else(|| {
            let mut sorted = topics.to_vec();
            sorted.sort();
            format!("stockcart-{}", sorted.join("-"))
        })
    }
}

/// Builder for configuring a [`RedpandaEventBus`].
#[derive(Default)]
pub struct RedpandaEventBusBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
    consumer_group: Option<String>,
    buffer_size: Option<usize>,
    auto_offset_reset: Option<String>,
}

impl RedpandaEventBusBuilder {
    /// Set the comma-separated broker addresses.
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode: "0", "1" or "all".
    ///
    /// Default: "1"
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the compression codec.
    ///
    /// Default: "none"
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the producer send timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the consumer group ID for subscriptions.
    ///
    /// Instances sharing a group split the partitions between them.
    #[must_use]
    pub fn consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.consumer_group = Some(consumer_group.into());
        self
    }

    /// Set how many records may wait between the consumer and the subscriber.
    ///
    /// Default: 1000. Zero is raised to one.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size.max(1));
        self
    }

    /// Set where new consumer groups start reading: "earliest", "latest" or "error".
    ///
    /// Default: "latest"
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Build the [`RedpandaEventBus`].
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if brokers are not set or the
    /// producer configuration is rejected.
    pub fn build(self) -> Result<RedpandaEventBus, EventBusError> {
        let brokers = self
            .brokers
            .ok_or_else(|| EventBusError::ConnectionFailed("Brokers not configured".to_string()))?;
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let acks = self.producer_acks.as_deref().unwrap_or(DEFAULT_ACKS);
        let compression = self.compression.as_deref().unwrap_or(DEFAULT_COMPRESSION);

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", acks)
            .set("compression.type", compression)
            .create()
            .map_err(|e| {
                EventBusError::ConnectionFailed(format!("Failed to create producer: {e}"))
            })?;

        let buffer_size = self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let auto_offset_reset = self
            .auto_offset_reset
            .unwrap_or_else(|| DEFAULT_OFFSET_RESET.to_string());

        tracing::info!(
            brokers = %brokers,
            acks,
            compression,
            buffer_size,
            auto_offset_reset = %auto_offset_reset,
            "RedpandaEventBus created"
        );

        Ok(RedpandaEventBus {
            producer,
            brokers,
            timeout,
            consumer_group: self.consumer_group,
            buffer_size,
            auto_offset_reset,
        })
    }
}

/// Convert a consumed message into a record.
///
/// Missing keys become empty strings; a missing broker timestamp falls back to now.
fn to_record(message: &BorrowedMessage<'_>) -> Result<EventRecord, EventBusError> {
    let payload = message.payload().ok_or_else(|| {
        EventBusError::TransportError(format!(
            "Message at {}/{}@{} has no payload",
            message.topic(),
            message.partition(),
            message.offset()
        ))
    })?;
    let key = message
        .key()
        .map(|k| String::from_utf8_lossy(k).into_owned())
        .unwrap_or_default();
    let timestamp = message
        .timestamp()
        .to_millis()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(Utc::now);

    Ok(EventRecord::new(key, payload.to_vec(), timestamp))
}

impl EventBus for RedpandaEventBus {
    fn publish(
        &self,
        topic: &str,
        record: &EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let record = record.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let kafka_record = FutureRecord::to(&topic)
                .key(record.key.as_bytes())
                .payload(&record.payload)
                .timestamp(record.timestamp.timestamp_millis());

            match self
                .producer
                .send(kafka_record, Timeout::After(timeout))
                .await
            {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        key = %record.key,
                        partition,
                        offset,
                        "Record published"
                    );
                    Ok(())
                },
                Err((kafka_error, _)) => Err(EventBusError::PublishFailed {
                    topic,
                    reason: kafka_error.to_string(),
                }),
            }
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();
        let consumer_group_id = self.consumer_group_for(&topics);
        let brokers = self.brokers.clone();
        let buffer_size = self.buffer_size;
        let auto_offset_reset = self.auto_offset_reset.clone();

        Box::pin(async move {
            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &brokers)
                .set("group.id", &consumer_group_id)
                .set("enable.auto.commit", "false")
                .set("auto.offset.reset", &auto_offset_reset)
                .set("session.timeout.ms", "6000")
                .set("enable.partition.eof", "false")
                .create()
                .map_err(|e| EventBusError::SubscriptionFailed {
                    topics: topics.clone(),
                    reason: format!("Failed to create consumer: {e}"),
                })?;

            let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
            consumer
                .subscribe(&topic_refs)
                .map_err(|e| EventBusError::SubscriptionFailed {
                    topics: topics.clone(),
                    reason: format!("Failed to subscribe to topics: {e}"),
                })?;

            tracing::info!(
                topics = ?topics,
                consumer_group = %consumer_group_id,
                buffer_size,
                auto_offset_reset = %auto_offset_reset,
                "Subscribed to topics"
            );

            let (tx, rx) = tokio::sync::mpsc::channel(buffer_size);

            tokio::spawn(async move {
                use futures::StreamExt;
                use rdkafka::consumer::CommitMode;

                let mut stream = consumer.stream();

                while let Some(msg_result) = stream.next().await {
                    match msg_result {
                        Ok(message) => {
                            // Commit only once the subscriber holds the record.
                            if tx.send(to_record(&message)).await.is_err() {
                                tracing::debug!("Subscriber dropped, exiting consumer task");
                                break;
                            }
                            if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                                tracing::warn!(
                                    topic = message.topic(),
                                    partition = message.partition(),
                                    offset = message.offset(),
                                    error = %e,
                                    "Failed to commit offset (message may be redelivered)"
                                );
                            }
                        },
                        Err(e) => {
                            let err = EventBusError::TransportError(format!(
                                "Failed to receive message: {e}"
                            ));
                            if tx.send(Err(err)).await.is_err() {
                                break;
                            }
                        },
                    }
                }

                tracing::debug!("Consumer task exiting");
            });

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }

    fn flush(&self, timeout: Duration) -> Result<(), EventBusError> {
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(|e| EventBusError::TransportError(format!("Flush failed: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn redpanda_event_bus_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedpandaEventBus>();
        assert_sync::<RedpandaEventBus>();
    }

    #[test]
    fn build_without_brokers_fails() {
        let result = RedpandaEventBus::builder().build();
        assert!(matches!(result, Err(EventBusError::ConnectionFailed(_))));
    }

    #[test]
    fn build_applies_defaults() {
        // librdkafka does not connect until the first request.
        let bus = RedpandaEventBus::new("localhost:9092").unwrap();
        assert_eq!(bus.brokers(), "localhost:9092");
        assert_eq!(bus.timeout, DEFAULT_TIMEOUT);
        assert_eq!(bus.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(bus.auto_offset_reset, "latest");
    }

    #[test]
    fn zero_buffer_size_is_raised() {
        let bus = RedpandaEventBus::builder()
            .brokers("localhost:9092")
            .buffer_size(0)
            .build()
            .unwrap();
        assert_eq!(bus.buffer_size, 1);
    }

    #[test]
    fn consumer_group_defaults_to_sorted_topics() {
        let bus = RedpandaEventBus::new("localhost:9092").unwrap();
        let topics = vec!["stock-events".to_string(), "cart-events".to_string()];
        assert_eq!(bus.consumer_group_for(&topics), "stockcart-cart-events-stock-events");

        let bus = RedpandaEventBus::builder()
            .brokers("localhost:9092")
            .consumer_group("audit")
            .build()
            .unwrap();
        assert_eq!(bus.consumer_group_for(&topics), "audit");
    }
}
