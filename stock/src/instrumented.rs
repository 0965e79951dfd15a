//! Tracing and metrics around a stock ledger.

use stockcart_core::ledger::{LedgerFuture, StockLookup, StockOperations};
use stockcart_core::{ClaimOutcome, LocationQuery, NewStockItem, Sku, StockItem, StockPage};
use stockcart_runtime::metrics::observe;
use tracing::Instrument;

const SERVICE: &str = "stock";

/// Wraps a [`StockOperations`] with one span and one metrics sample per call.
#[derive(Clone)]
pub struct InstrumentedStock<L> {
    inner: L,
}

impl<L> InstrumentedStock<L> {
    /// Wrap `inner`.
    #[must_use]
    pub const fn new(inner: L) -> Self {
        Self { inner }
    }
}

impl<L: StockOperations> StockOperations for InstrumentedStock<L> {
    fn add_item<'a>(&'a self, item: &'a NewStockItem) -> LedgerFuture<'a, ClaimOutcome> {
        let span = tracing::info_span!("stock.add_item", sku = %item.sku, user_id = %item.owner);
        Box::pin(observe(SERVICE, "add_item", self.inner.add_item(item)).instrument(span))
    }

    fn delete_item(&self, sku: Sku) -> LedgerFuture<'_, ()> {
        let span = tracing::info_span!("stock.delete_item", sku = %sku);
        Box::pin(observe(SERVICE, "delete_item", self.inner.delete_item(sku)).instrument(span))
    }

    fn get_item_by_sku(&self, sku: Sku) -> LedgerFuture<'_, StockItem> {
        let span = tracing::info_span!("stock.get_item_by_sku", sku = %sku);
        Box::pin(
            observe(SERVICE, "get_item_by_sku", self.inner.get_item_by_sku(sku)).instrument(span),
        )
    }

    fn list_by_location<'a>(&'a self, query: &'a LocationQuery) -> LedgerFuture<'a, StockPage> {
        let span = tracing::info_span!(
            "stock.list_by_location",
            user_id = %query.user_id,
            location = %query.location,
            page = query.current_page,
        );
        Box::pin(
            observe(SERVICE, "list_by_location", self.inner.list_by_location(query))
                .instrument(span),
        )
    }
}

impl<L: StockOperations> StockLookup for InstrumentedStock<L> {
    fn get_stock(&self, sku: Sku) -> LedgerFuture<'_, StockItem> {
        self.get_item_by_sku(sku)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::StockLedger;
    use std::sync::Arc;
    use stockcart_core::{LedgerError, UserId};
    use stockcart_runtime::EventEmitter;
    use stockcart_testing::{InMemoryEventBus, InMemoryStockStore, helpers, test_clock};

    #[tokio::test]
    async fn delegates_to_inner_ledger() {
        helpers::init_tracing();
        let store = InMemoryStockStore::new();
        store.add_catalog_entry(Sku(1), "widget", "tools").await;
        let emitter = Arc::new(EventEmitter::new(
            Arc::new(InMemoryEventBus::new()),
            "ledger-events",
            8,
        ));
        let stock = InstrumentedStock::new(StockLedger::new(
            Arc::new(store),
            emitter,
            Arc::new(test_clock()),
        ));

        let item = NewStockItem {
            owner: UserId(7),
            sku: Sku(1),
            count: 2,
            price: 10,
            location: "A1".to_string(),
        };
        assert_eq!(stock.add_item(&item).await, Ok(ClaimOutcome::Created));
        assert_eq!(stock.get_stock(Sku(1)).await.unwrap().count, 2);
        assert_eq!(stock.delete_item(Sku(2)).await, Err(LedgerError::NotFound));
    }
}
