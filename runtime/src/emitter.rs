//! Fire-and-forget publication of domain events.
//!
//! [`EventEmitter::emit`] encodes the event and hands it to a bounded channel;
//! it never waits on the bus. A single worker task publishes records in hand-off
//! order, which keeps per-SKU ordering intact. Publish failures are logged and
//! counted, never returned.
//!
//! An outstanding-send counter covers every event from hand-off until its publish
//! attempt finishes. [`EventEmitter::close`] stops accepting events, waits for the
//! counter to reach zero within a budget, then flushes the bus.

use crate::metrics::EmitterMetrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use stockcart_core::DomainEvent;
use stockcart_core::event_bus::{EventBus, EventRecord};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Default hand-off buffer size.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Errors from shutting the emitter down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    /// The budget expired with sends still outstanding
    #[error("Drain timed out with {0} events outstanding")]
    DrainTimeout(usize),

    /// The bus could not flush its buffer
    #[error("Flush failed: {0}")]
    Flush(String),
}

/// Decrements the outstanding counter when an envelope is dropped.
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Envelope {
    event_type: &'static str,
    record: EventRecord,
    _outstanding: AtomicCounterGuard,
}

/// Non-blocking publisher of [`DomainEvent`]s.
pub struct EventEmitter {
    sender: RwLock<Option<mpsc::Sender<Envelope>>>,
    outstanding: Arc<AtomicUsize>,
    bus: Arc<dyn EventBus>,
}

impl EventEmitter {
    /// Create an emitter publishing to `topic` and spawn its worker.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>, topic: impl Into<String>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(publish_loop(Arc::clone(&bus), topic.into(), receiver));
        Self {
            sender: RwLock::new(Some(sender)),
            outstanding: Arc::new(AtomicUsize::new(0)),
            bus,
        }
    }

    /// Hand `event` to the publisher without waiting.
    ///
    /// Drops the event (logged and counted) if it cannot be encoded, the buffer is
    /// full, or the emitter is closed.
    pub fn emit(&self, event: &DomainEvent) {
        let payload = match event.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(event_type = %event.event_type, error = %e, "Failed to encode event");
                EmitterMetrics::record_dropped("encode");
                return;
            }
        };

        let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            tracing::warn!(event_type = %event.event_type, sku = %event.payload.sku, "Emitter closed, dropping event");
            EmitterMetrics::record_dropped("closed");
            return;
        };

        self.outstanding.fetch_add(1, Ordering::SeqCst);
        let envelope = Envelope {
            event_type: event.event_type.as_str(),
            record: EventRecord::new(event.partition_key(), payload, event.timestamp),
            _outstanding: AtomicCounterGuard(Arc::clone(&self.outstanding)),
        };

        match sender.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(event_type = %event.event_type, sku = %event.payload.sku, "Emitter buffer full, dropping event");
                EmitterMetrics::record_dropped("full");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(event_type = %event.event_type, sku = %event.payload.sku, "Publisher stopped, dropping event");
                EmitterMetrics::record_dropped("closed");
            }
        }
    }

    /// Number of events handed off whose publish attempt has not finished.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Wait until no sends are outstanding.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::DrainTimeout`] if sends are still outstanding
    /// when `timeout` expires.
    pub async fn drain(&self, timeout: Duration) -> Result<(), EmitterError> {
        let start = Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            let pending = self.outstanding();

            if pending == 0 {
                return Ok(());
            }

            if start.elapsed() >= timeout {
                tracing::error!(
                    outstanding = pending,
                    "Drain timeout: {} events still outstanding", pending
                );
                return Err(EmitterError::DrainTimeout(pending));
            }

            tracing::debug!(
                outstanding = pending,
                elapsed_ms = start.elapsed().as_millis(),
                "Waiting for events to publish"
            );

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Stop accepting events, drain within `budget`, then flush the bus with
    /// whatever budget remains.
    ///
    /// # Errors
    ///
    /// - [`EmitterError::DrainTimeout`] if sends were still outstanding at the deadline
    /// - [`EmitterError::Flush`] if the bus could not flush
    pub async fn close(&self, budget: Duration) -> Result<(), EmitterError> {
        tracing::info!("Closing event emitter");
        let start = Instant::now();

        // Dropping the sender lets the worker exit once the buffer is empty.
        drop(
            self.sender
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );

        let drained = self.drain(budget).await;

        let remaining = budget.saturating_sub(start.elapsed());
        let bus = Arc::clone(&self.bus);
        let flushed = tokio::task::spawn_blocking(move || bus.flush(remaining))
            .await
            .map_err(|e| EmitterError::Flush(e.to_string()))?;

        drained?;
        flushed.map_err(|e| EmitterError::Flush(e.to_string()))?;

        tracing::info!("Event emitter closed");
        Ok(())
    }
}

async fn publish_loop(
    bus: Arc<dyn EventBus>,
    topic: String,
    mut receiver: mpsc::Receiver<Envelope>,
) {
    while let Some(envelope) = receiver.recv().await {
        match bus.publish(&topic, &envelope.record).await {
            Ok(()) => {
                tracing::debug!(
                    topic = %topic,
                    key = %envelope.record.key,
                    event_type = envelope.event_type,
                    "Published event"
                );
                EmitterMetrics::record_published(envelope.event_type);
            }
            Err(e) => {
                tracing::error!(
                    topic = %topic,
                    key = %envelope.record.key,
                    event_type = envelope.event_type,
                    error = %e,
                    "Failed to publish event"
                );
                EmitterMetrics::record_publish_failed();
            }
        }
    }
    tracing::debug!(topic = %topic, "Event publisher stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use stockcart_core::event::INSUFFICIENT_STOCK_REASON;
    use stockcart_core::{Reservation, Sku, UserId};
    use stockcart_testing::{InMemoryEventBus, test_clock};
    use stockcart_core::environment::Clock;

    fn event(sku: u32) -> DomainEvent {
        let reservation = Reservation {
            user_id: UserId(1),
            sku: Sku(sku),
            count: 1,
        };
        DomainEvent::cart_item_failed(
            &reservation,
            100,
            INSUFFICIENT_STOCK_REASON,
            test_clock().now(),
        )
    }

    #[tokio::test]
    async fn publishes_keyed_by_sku_in_emit_order() {
        let bus = InMemoryEventBus::new();
        let emitter = EventEmitter::new(Arc::new(bus.clone()), "ledger-events", 16);

        emitter.emit(&event(7));
        emitter.emit(&event(3));
        emitter.emit(&event(7));
        emitter.drain(Duration::from_secs(1)).await.unwrap();

        let keys: Vec<_> = bus.published().into_iter().map(|p| p.record.key).collect();
        assert_eq!(keys, vec!["7", "3", "7"]);
        assert!(bus.published().iter().all(|p| p.topic == "ledger-events"));
    }

    #[tokio::test]
    async fn record_timestamp_matches_event() {
        let bus = InMemoryEventBus::new();
        let emitter = EventEmitter::new(Arc::new(bus.clone()), "ledger-events", 16);

        emitter.emit(&event(7));
        emitter.drain(Duration::from_secs(1)).await.unwrap();

        let published = bus.published();
        assert_eq!(published[0].record.timestamp, test_clock().now());
        assert_eq!(bus.events()[0], event(7));
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        let bus = InMemoryEventBus::new();
        bus.set_failing(true);
        let emitter = EventEmitter::new(Arc::new(bus.clone()), "ledger-events", 16);

        emitter.emit(&event(1));
        emitter.drain(Duration::from_secs(1)).await.unwrap();

        assert!(bus.is_empty());
        assert_eq!(emitter.outstanding(), 0);
    }

    #[tokio::test]
    async fn full_buffer_drops_without_blocking() {
        let bus = InMemoryEventBus::new().with_publish_delay(Duration::from_millis(200));
        let emitter = EventEmitter::new(Arc::new(bus.clone()), "ledger-events", 1);

        let start = Instant::now();
        for sku in 0..10 {
            emitter.emit(&event(sku));
        }
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(emitter.outstanding() <= 2);
    }

    #[tokio::test]
    async fn close_drains_then_flushes() {
        let bus = InMemoryEventBus::new().with_publish_delay(Duration::from_millis(20));
        let emitter = EventEmitter::new(Arc::new(bus.clone()), "ledger-events", 16);

        emitter.emit(&event(1));
        emitter.emit(&event(2));
        emitter.close(Duration::from_secs(2)).await.unwrap();

        assert_eq!(bus.len(), 2);
        assert_eq!(bus.flush_count(), 1);
    }

    #[tokio::test]
    async fn close_reports_outstanding_on_timeout() {
        let bus = InMemoryEventBus::new().with_publish_delay(Duration::from_secs(5));
        let emitter = EventEmitter::new(Arc::new(bus.clone()), "ledger-events", 16);

        emitter.emit(&event(1));
        let result = emitter.close(Duration::from_millis(50)).await;

        assert_eq!(result, Err(EmitterError::DrainTimeout(1)));
        assert_eq!(bus.flush_count(), 1);
    }

    #[tokio::test]
    async fn emit_after_close_is_dropped() {
        let bus = InMemoryEventBus::new();
        let emitter = EventEmitter::new(Arc::new(bus.clone()), "ledger-events", 16);
        emitter.close(Duration::from_secs(1)).await.unwrap();

        emitter.emit(&event(1));

        assert_eq!(emitter.outstanding(), 0);
        assert!(bus.is_empty());
    }
}
