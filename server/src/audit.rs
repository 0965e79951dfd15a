//! Audit consumer: logs and counts every ledger event on the topic.
//!
//! Records are decoded as [`DomainEvent`]s. Records with an unknown `type` or an
//! undecodable body are logged and skipped; the stream keeps going.

use crate::shutdown::Shutdown;
use futures::StreamExt;
use stockcart_core::event_bus::{EventRecord, EventStream};
use stockcart_core::{DomainEvent, LedgerError};
use stockcart_runtime::metrics::AuditMetrics;

/// Counts from one [`AuditConsumer::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuditSummary {
    /// Events decoded and recorded
    pub handled: u64,
    /// Records skipped (unknown type, bad body, transport error)
    pub skipped: u64,
}

/// Handles records from the ledger events topic.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditConsumer;

impl AuditConsumer {
    /// Decode one record, log it, and count it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UnknownEventType`] if `type` is outside the known set
    /// - [`LedgerError::Internal`] if the body is not a valid event
    pub fn handle_record(&self, record: &EventRecord) -> Result<DomainEvent, LedgerError> {
        let event = DomainEvent::from_json(&record.payload)?;

        tracing::info!(
            key = %record.key,
            event_type = %event.event_type,
            service = event.service.as_str(),
            sku = %event.payload.sku,
            count = event.payload.count,
            price = event.payload.price,
            status = ?event.payload.status,
            reason = %event.payload.reason,
            timestamp = %event.timestamp,
            "Ledger event"
        );
        AuditMetrics::record_event(event.event_type.as_str(), event.service.as_str());

        Ok(event)
    }

    /// Consume `stream` until it ends or `shutdown` fires.
    pub async fn run(&self, mut stream: EventStream, shutdown: Shutdown) -> AuditSummary {
        let mut summary = AuditSummary::default();
        let stop = shutdown.wait();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                () = &mut stop => {
                    tracing::info!("Audit consumer stopping");
                    break;
                },
                next = stream.next() => match next {
                    None => {
                        tracing::info!("Event stream ended");
                        break;
                    },
                    Some(Ok(record)) => match self.handle_record(&record) {
                        Ok(_) => summary.handled += 1,
                        Err(LedgerError::UnknownEventType(event_type)) => {
                            tracing::warn!(key = %record.key, event_type = %event_type, "Skipping unknown event type");
                            summary.skipped += 1;
                        },
                        Err(e) => {
                            tracing::warn!(key = %record.key, error = %e, "Skipping undecodable record");
                            summary.skipped += 1;
                        },
                    },
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Failed to receive record");
                        summary.skipped += 1;
                    },
                },
            }
        }

        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stockcart_core::event_bus::EventBus;
    use stockcart_core::{EventType, Reservation, Sku, UserId};
    use stockcart_testing::InMemoryEventBus;

    fn record(payload: &[u8]) -> EventRecord {
        EventRecord::new(
            "1001".to_string(),
            payload.to_vec(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn added_event() -> DomainEvent {
        let reservation = Reservation {
            user_id: UserId(42),
            sku: Sku(1001),
            count: 2,
        };
        DomainEvent::cart_item_added(
            &reservation,
            100,
            7,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn decodes_known_events() {
        let event = added_event();
        let handled = AuditConsumer
            .handle_record(&record(&event.to_json().unwrap()))
            .unwrap();
        assert_eq!(handled, event);
        assert_eq!(handled.event_type, EventType::CartItemAdded);
    }

    #[test]
    fn unknown_type_is_reported() {
        let body = br#"{"type":"stock_item_moved","service":"stock","timestamp":"2025-01-01T00:00:00Z","payload":{"sku":1,"count":1,"price":1,"status":"success"}}"#;
        let err = AuditConsumer.handle_record(&record(body)).unwrap_err();
        assert_eq!(err, LedgerError::UnknownEventType("stock_item_moved".to_string()));
    }

    #[test]
    fn garbage_is_internal() {
        let err = AuditConsumer.handle_record(&record(b"not json")).unwrap_err();
        assert!(matches!(err, LedgerError::Internal(_)));
    }

    #[tokio::test]
    async fn run_skips_bad_records_and_stops_on_shutdown() {
        let bus = InMemoryEventBus::new();
        let stream = bus.subscribe(&["ledger-events"]).await.unwrap();
        let (trigger, shutdown) = Shutdown::channel();
        let consumer = tokio::spawn(async move { AuditConsumer.run(stream, shutdown).await });

        bus.publish("ledger-events", &record(&added_event().to_json().unwrap()))
            .await
            .unwrap();
        bus.publish("ledger-events", &record(b"not json"))
            .await
            .unwrap();
        bus.publish("ledger-events", &record(&added_event().to_json().unwrap()))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        trigger.fire();

        let summary = consumer.await.unwrap();
        assert_eq!(
            summary,
            AuditSummary {
                handled: 2,
                skipped: 1
            }
        );
    }
}
