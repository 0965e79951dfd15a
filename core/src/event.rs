//! Audit events describing ledger mutations.
//!
//! Each event is published as one JSON object:
//!
//! ```text
//! {
//!   "type": "cart_item_added" | "cart_item_failed" | "stock_item_created" | "stock_item_changed",
//!   "service": "cart" | "stock",
//!   "timestamp": "2024-05-01T12:00:00Z",
//!   "payload": { "sku": 1001, "count": 3, "price": 250, "status": "success", "reason": "..." }
//! }
//! ```
//!
//! Events for the same SKU share a partition key (the decimal SKU) so consumers
//! see them in publish order. Nothing is guaranteed across SKUs.

use crate::types::{ClaimOutcome, NewStockItem, Reservation, Sku};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reason attached to a rejected reservation.
pub const INSUFFICIENT_STOCK_REASON: &str = "insufficient stock";

/// Error types for event encoding and decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),

    /// Unknown event type encountered during deserialization.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

/// The closed set of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A stock row was inserted
    StockItemCreated,
    /// An existing stock row was topped up
    StockItemChanged,
    /// A reservation was admitted and written
    CartItemAdded,
    /// A reservation was rejected; nothing was written
    CartItemFailed,
}

impl EventType {
    /// Wire name of the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StockItemCreated => "stock_item_created",
            Self::StockItemChanged => "stock_item_changed",
            Self::CartItemAdded => "cart_item_added",
            Self::CartItemFailed => "cart_item_failed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock_item_created" => Ok(Self::StockItemCreated),
            "stock_item_changed" => Ok(Self::StockItemChanged),
            "cart_item_added" => Ok(Self::CartItemAdded),
            "cart_item_failed" => Ok(Self::CartItemFailed),
            other => Err(EventError::UnknownEventType(other.to_string())),
        }
    }
}

/// Which service emitted the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTag {
    /// The stock service
    Stock,
    /// The cart service
    Cart,
}

impl ServiceTag {
    /// Wire name of the service.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Cart => "cart",
        }
    }
}

/// Outcome recorded in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// The mutation was applied
    Success,
    /// The request was rejected
    Failed,
}

/// Event body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// SKU the event is about
    pub sku: Sku,
    /// Units added or requested
    pub count: u32,
    /// Unit price at the time of the event
    pub price: u32,
    /// Applied or rejected
    pub status: EventStatus,
    /// Rejection reason
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Id of the cart row written by an admitted reservation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<i64>,
}

/// An immutable audit record of a ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event kind
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Emitting service
    pub service: ServiceTag,
    /// When the event was built
    pub timestamp: DateTime<Utc>,
    /// Event body
    pub payload: EventPayload,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    service: ServiceTag,
    timestamp: DateTime<Utc>,
    payload: EventPayload,
}

impl DomainEvent {
    /// Event for a committed stock claim.
    #[must_use]
    pub fn stock_item(outcome: ClaimOutcome, item: &NewStockItem, at: DateTime<Utc>) -> Self {
        let event_type = match outcome {
            ClaimOutcome::Created => EventType::StockItemCreated,
            ClaimOutcome::Changed => EventType::StockItemChanged,
        };
        Self {
            event_type,
            service: ServiceTag::Stock,
            timestamp: at,
            payload: EventPayload {
                sku: item.sku,
                count: item.count,
                price: item.price,
                status: EventStatus::Success,
                reason: String::new(),
                cart_id: None,
            },
        }
    }

    /// Event for an admitted reservation.
    #[must_use]
    pub const fn cart_item_added(
        reservation: &Reservation,
        price: u32,
        cart_id: i64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: EventType::CartItemAdded,
            service: ServiceTag::Cart,
            timestamp: at,
            payload: EventPayload {
                sku: reservation.sku,
                count: reservation.count,
                price,
                status: EventStatus::Success,
                reason: String::new(),
                cart_id: Some(cart_id),
            },
        }
    }

    /// Event for a rejected reservation.
    #[must_use]
    pub fn cart_item_failed(
        reservation: &Reservation,
        price: u32,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: EventType::CartItemFailed,
            service: ServiceTag::Cart,
            timestamp: at,
            payload: EventPayload {
                sku: reservation.sku,
                count: reservation.count,
                price,
                status: EventStatus::Failed,
                reason: reason.into(),
                cart_id: None,
            },
        }
    }

    /// Partition key: the SKU as a decimal string.
    #[must_use]
    pub fn partition_key(&self) -> String {
        self.payload.sku.partition_key()
    }

    /// Encode as the JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::SerializationError`] if encoding fails.
    pub fn to_json(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Decode from the JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownEventType`] when `type` is outside the known
    /// set, or [`EventError::DeserializationError`] for malformed input.
    pub fn from_json(bytes: &[u8]) -> Result<Self, EventError> {
        let raw: RawEvent = serde_json::from_slice(bytes)
            .map_err(|e| EventError::DeserializationError(e.to_string()))?;
        Ok(Self {
            event_type: raw.event_type.parse()?,
            service: raw.service,
            timestamp: raw.timestamp,
            payload: raw.payload,
        })
    }
}

impl fmt::Display for DomainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (service: {}, sku: {})",
            self.event_type,
            self.service.as_str(),
            self.payload.sku
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::UserId;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn reservation() -> Reservation {
        Reservation {
            user_id: UserId(42),
            sku: Sku(1001),
            count: 3,
        }
    }

    #[test]
    fn stock_event_type_follows_claim_outcome() {
        let item = NewStockItem {
            owner: UserId(7),
            sku: Sku(1001),
            count: 5,
            price: 250,
            location: "A1".to_string(),
        };
        let created = DomainEvent::stock_item(ClaimOutcome::Created, &item, at());
        let changed = DomainEvent::stock_item(ClaimOutcome::Changed, &item, at());

        assert_eq!(created.event_type, EventType::StockItemCreated);
        assert_eq!(changed.event_type, EventType::StockItemChanged);
        assert_eq!(created.service, ServiceTag::Stock);
        assert_eq!(created.payload.status, EventStatus::Success);
    }

    #[test]
    fn rejected_reservation_wire_format() {
        let event =
            DomainEvent::cart_item_failed(&reservation(), 250, INSUFFICIENT_STOCK_REASON, at());
        let json: serde_json::Value = serde_json::from_slice(&event.to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "cart_item_failed");
        assert_eq!(json["service"], "cart");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
        assert_eq!(json["payload"]["sku"], 1001);
        assert_eq!(json["payload"]["count"], 3);
        assert_eq!(json["payload"]["status"], "failed");
        assert_eq!(json["payload"]["reason"], "insufficient stock");
        assert!(json["payload"].get("cart_id").is_none());
    }

    #[test]
    fn empty_reason_is_omitted() {
        let event = DomainEvent::cart_item_added(&reservation(), 250, 17, at());
        let json: serde_json::Value = serde_json::from_slice(&event.to_json().unwrap()).unwrap();

        assert!(json["payload"].get("reason").is_none());
        assert_eq!(json["payload"]["cart_id"], 17);
        assert_eq!(json["payload"]["status"], "success");
    }

    #[test]
    fn partition_key_is_decimal_sku() {
        let event = DomainEvent::cart_item_added(&reservation(), 250, 17, at());
        assert_eq!(event.partition_key(), "1001");
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let bytes = br#"{"type":"order_placed","service":"cart","timestamp":"2024-05-01T12:00:00Z",
            "payload":{"sku":1,"count":1,"price":1,"status":"success"}}"#;
        let err = DomainEvent::from_json(bytes).unwrap_err();
        assert_eq!(err, EventError::UnknownEventType("order_placed".to_string()));
    }

    #[test]
    fn decode_accepts_published_event() {
        let event = DomainEvent::cart_item_added(&reservation(), 250, 17, at());
        let decoded = DomainEvent::from_json(&event.to_json().unwrap()).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn event_type_parse_matches_display() {
        for kind in [
            EventType::StockItemCreated,
            EventType::StockItemChanged,
            EventType::CartItemAdded,
            EventType::CartItemFailed,
        ] {
            assert_eq!(kind.to_string().parse::<EventType>().unwrap(), kind);
        }
    }
}
