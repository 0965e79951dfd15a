//! Integration tests for [`RedpandaEventBus`] against a real Kafka-compatible broker.
//!
//! # Running These Tests
//!
//! These tests are marked `#[ignore]` because they need Docker (testcontainers)
//! and take 15-60 seconds each to start the broker:
//!
//! ```bash
//! cargo test -p stockcart-redpanda --test integration_tests -- --ignored
//! ```

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use futures::StreamExt;
use std::time::Duration;
use stockcart_core::event_bus::{EventBus, EventRecord};
use stockcart_core::{ClaimOutcome, DomainEvent, EventType, NewStockItem, Sku, UserId};
use stockcart_redpanda::RedpandaEventBus;
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::kafka::{KAFKA_PORT, Kafka};

const WARMUP_KEY: &str = "warmup";

fn warmup() -> EventRecord {
    EventRecord::new(WARMUP_KEY.to_string(), vec![0], Utc::now())
}

fn stock_event(sku: u32, count: u32) -> DomainEvent {
    let item = NewStockItem {
        owner: UserId(7),
        sku: Sku(sku),
        count,
        price: 250,
        location: "warehouse-a".to_string(),
    };
    DomainEvent::stock_item(
        ClaimOutcome::Changed,
        &item,
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
    )
}

fn record(event: &DomainEvent) -> EventRecord {
    EventRecord::new(event.partition_key(), event.to_json().unwrap(), event.timestamp)
}

/// Start a broker and return it with a bus reading from the earliest offset.
async fn start() -> (ContainerAsync<Kafka>, RedpandaEventBus) {
    let kafka = Kafka::default()
        .with_env_var("KAFKA_AUTO_CREATE_TOPICS_ENABLE", "true")
        .start()
        .await
        .expect("Failed to start Kafka container");

    let host = kafka.get_host().await.expect("Failed to get host");
    let port = kafka
        .get_host_port_ipv4(KAFKA_PORT)
        .await
        .expect("Failed to get port");
    let brokers = format!("{host}:{port}");

    let bus = RedpandaEventBus::builder()
        .brokers(&brokers)
        .auto_offset_reset("earliest")
        .build()
        .expect("Failed to create event bus");

    (kafka, bus)
}

/// Publish until the topic exists and metadata has propagated.
async fn ensure_topic_exists(bus: &RedpandaEventBus, topic: &str) {
    for attempt in 1..=60 {
        if bus.publish(topic, &warmup()).await.is_ok() {
            tokio::time::sleep(Duration::from_secs(3)).await;
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(attempt != 60, "Failed to create topic {topic}");
    }
}

/// Collect `n` non-warmup records.
async fn receive(bus: &RedpandaEventBus, topic: &str, n: usize) -> Vec<EventRecord> {
    let mut stream = bus.subscribe(&[topic]).await.expect("Failed to subscribe");
    let mut received = Vec::new();
    tokio::time::timeout(Duration::from_secs(20), async {
        while received.len() < n {
            if let Some(result) = stream.next().await {
                let record = result.expect("Failed to receive record");
                if record.key != WARMUP_KEY {
                    received.push(record);
                }
            }
        }
    })
    .await
    .expect("Timeout waiting for records");
    received
}

#[tokio::test]
#[ignore]
async fn record_key_payload_and_timestamp_survive_the_broker() {
    let (_kafka, bus) = start().await;
    ensure_topic_exists(&bus, "ledger-events").await;

    let event = stock_event(1001, 3);
    bus.publish("ledger-events", &record(&event))
        .await
        .expect("Failed to publish");

    let received = receive(&bus, "ledger-events", 1).await;

    assert_eq!(received[0].key, "1001");
    assert_eq!(received[0].timestamp, event.timestamp);
    let decoded = DomainEvent::from_json(&received[0].payload).unwrap();
    assert_eq!(decoded, event);
    assert_eq!(decoded.event_type, EventType::StockItemChanged);
}

#[tokio::test]
#[ignore]
async fn events_for_one_sku_keep_publish_order() {
    let (_kafka, bus) = start().await;
    ensure_topic_exists(&bus, "ordering-test").await;

    for count in 1..=5 {
        bus.publish("ordering-test", &record(&stock_event(1001, count)))
            .await
            .expect("Failed to publish");
    }

    let counts: Vec<u32> = receive(&bus, "ordering-test", 5)
        .await
        .iter()
        .map(|r| DomainEvent::from_json(&r.payload).unwrap().payload.count)
        .collect();
    assert_eq!(counts, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
#[ignore]
async fn flush_completes_with_nothing_buffered() {
    let (_kafka, bus) = start().await;
    ensure_topic_exists(&bus, "flush-test").await;

    bus.publish("flush-test", &record(&stock_event(1001, 1)))
        .await
        .expect("Failed to publish");

    bus.flush(Duration::from_secs(5)).expect("Flush failed");
}
