//! In-memory event bus that records every publish.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use stockcart_core::DomainEvent;
use stockcart_core::event_bus::{EventBus, EventBusError, EventRecord, EventStream};
use tokio::sync::broadcast;

/// A record as it reached the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    /// Destination topic
    pub topic: String,
    /// The record
    pub record: EventRecord,
}

/// In-memory [`EventBus`] for tests.
///
/// Records publishes in order, can be switched to fail, and can delay each
/// publish to simulate a slow broker.
#[derive(Clone, Debug)]
pub struct InMemoryEventBus {
    published: Arc<RwLock<Vec<PublishedRecord>>>,
    live: broadcast::Sender<PublishedRecord>,
    failing: Arc<AtomicBool>,
    flushes: Arc<AtomicUsize>,
    publish_delay: Option<Duration>,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventBus {
    /// Create an empty bus
    #[must_use]
    pub fn new() -> Self {
        let (live, _) = broadcast::channel(1024);
        Self {
            published: Arc::new(RwLock::new(Vec::new())),
            live,
            failing: Arc::new(AtomicBool::new(false)),
            flushes: Arc::new(AtomicUsize::new(0)),
            publish_delay: None,
        }
    }

    /// Sleep for `delay` inside every publish.
    #[must_use]
    pub const fn with_publish_delay(mut self, delay: Duration) -> Self {
        self.publish_delay = Some(delay);
        self
    }

    /// Make every subsequent publish fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything published so far, in publish order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedRecord> {
        self.published.read().unwrap().clone()
    }

    /// Published payloads decoded as domain events.
    #[must_use]
    pub fn events(&self) -> Vec<DomainEvent> {
        self.published
            .read()
            .unwrap()
            .iter()
            .map(|p| DomainEvent::from_json(&p.record.payload).unwrap())
            .collect()
    }

    /// Number of records published.
    #[must_use]
    pub fn len(&self) -> usize {
        self.published.read().unwrap().len()
    }

    /// Whether nothing was published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.published.read().unwrap().is_empty()
    }

    /// How many times `flush` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        record: &EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let published = PublishedRecord {
            topic: topic.to_string(),
            record: record.clone(),
        };
        Box::pin(async move {
            if let Some(delay) = self.publish_delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(EventBusError::PublishFailed {
                    topic: published.topic,
                    reason: "injected failure".to_string(),
                });
            }
            self.published.write().unwrap().push(published.clone());
            let _ = self.live.send(published);
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|t| (*t).to_string()).collect();
        let mut receiver = self.live.subscribe();
        Box::pin(async move {
            let stream = async_stream::stream! {
                loop {
                    match receiver.recv().await {
                        Ok(published) => {
                            if topics.contains(&published.topic) {
                                yield Ok(published.record);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            yield Err(EventBusError::TransportError(format!(
                                "subscriber lagged by {skipped} records"
                            )));
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            };
            Ok(Box::pin(stream) as EventStream)
        })
    }

    fn flush(&self, _timeout: Duration) -> Result<(), EventBusError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
