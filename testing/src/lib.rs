//! # Stockcart Testing
//!
//! Testing utilities for the stock and cart ledgers.
//!
//! This crate provides:
//! - In-memory [`StockStore`](stockcart_core::store::StockStore) and
//!   [`CartStore`](stockcart_core::store::CartStore) implementations
//! - An in-memory [`EventBus`](stockcart_core::event_bus::EventBus) that records
//!   what was published
//! - A scripted [`StockLookup`](stockcart_core::ledger::StockLookup) with an
//!   injectable delay for deadline tests
//! - A fixed clock
//!
//! ## Example
//!
//! ```ignore
//! use stockcart_testing::{InMemoryCartStore, InMemoryEventBus, ScriptedStockLookup, test_clock};
//!
//! #[tokio::test]
//! async fn rejects_over_reservation() {
//!     let lookup = ScriptedStockLookup::new();
//!     lookup.set_stock(stock_item(1001, 10, 250));
//!     let ledger = CartLedger::new(cart_store, Arc::new(lookup), emitter, Arc::new(test_clock()));
//!     // ...
//! }
//! ```

use chrono::{DateTime, Utc};
use stockcart_core::environment::Clock;

pub mod event_bus;
pub mod lookup;
pub mod stores;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making event timestamps reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use stockcart_testing::mocks::FixedClock;
    /// use stockcart_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and fixtures.
pub mod helpers {
    use stockcart_core::{Sku, StockItem, UserId};

    /// A claimed stock row with catalog fields filled in.
    #[must_use]
    pub fn stock_item(sku: u32, count: u32, price: u32) -> StockItem {
        StockItem {
            sku: Sku(sku),
            owner: Some(UserId(1)),
            count,
            price,
            location: "warehouse-a".to_string(),
            name: format!("item-{sku}"),
            kind: "general".to_string(),
        }
    }

    /// Install a test `tracing` subscriber writing through the test harness.
    ///
    /// Safe to call from many tests; only the first call installs.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use event_bus::{InMemoryEventBus, PublishedRecord};
pub use lookup::ScriptedStockLookup;
pub use mocks::{FixedClock, test_clock};
pub use stores::{InMemoryCartStore, InMemoryStockStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }
}
