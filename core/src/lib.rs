//! # Stockcart Core
//!
//! Shared vocabulary for two independently stored services:
//!
//! - **Stock**: owns authoritative per-SKU inventory (owner, count, price, location).
//! - **Cart**: owns per-(user, SKU) reserved quantities.
//!
//! The two never share a transaction. The cart reads stock through a synchronous
//! remote query ([`ledger::StockLookup`]) and both sides publish audit events
//! ([`event::DomainEvent`]) through a best-effort [`event_bus::EventBus`].
//!
//! ## Architecture
//!
//! ```text
//!   AddStock ──► StockLedger ──► StockStore (tx: lock catalog row, upsert) ──► commit
//!                    │
//!                    └──► EventEmitter ──► EventBus (key = SKU)
//!
//!   AddItemToCart ──► CartLedger ──► StockLookup (remote, bounded deadline)
//!                        │      └──► CartStore (read line, conditional upsert)
//!                        └──► EventEmitter ──► EventBus (key = SKU)
//! ```
//!
//! This crate contains no I/O. Adapters live in `stockcart-postgres`,
//! `stockcart-redpanda`, and the in-memory doubles in `stockcart-testing`.

pub use chrono::{DateTime, Utc};

pub mod error;
pub mod event;
pub mod event_bus;
pub mod ledger;
pub mod store;
pub mod types;

pub use error::{LedgerError, Result};
pub use event::{DomainEvent, EventPayload, EventStatus, EventType, ServiceTag};
pub use types::{
    CartItemView, CartLine, CartListing, ClaimOutcome, LocationQuery, NewStockItem,
    Reservation, Sku, SkuCatalogEntry, StockItem, StockPage, UserId,
};

/// Environment module - injected dependencies that are not stores or buses.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Event timestamps are taken from the clock so tests can assert exact wire output.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
