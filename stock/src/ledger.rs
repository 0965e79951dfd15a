//! Stock ledger.
//!
//! A claim runs in one store transaction: lock the catalog entry, compare the
//! recorded owner, upsert. Two concurrent first-claims of the same SKU queue on
//! the lock, so the second sees the first's owner and fails `AlreadyClaimed`.
//! The audit event is emitted only after commit.

use std::sync::Arc;

use stockcart_core::environment::Clock;
use stockcart_core::ledger::{LedgerFuture, StockLookup, StockOperations};
use stockcart_core::store::{StockStore, StockTransaction};
use stockcart_core::{
    ClaimOutcome, DomainEvent, LedgerError, LocationQuery, NewStockItem, Result, Sku, StockItem,
    StockPage,
};
use stockcart_runtime::EventEmitter;

/// Authoritative per-SKU inventory backed by a [`StockStore`].
#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn StockStore>,
    events: Arc<EventEmitter>,
    clock: Arc<dyn Clock>,
}

impl StockLedger {
    /// Create a ledger.
    #[must_use]
    pub fn new(store: Arc<dyn StockStore>, events: Arc<EventEmitter>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            events,
            clock,
        }
    }
}

/// Ownership check and upsert, inside an open transaction.
async fn claim(tx: &mut dyn StockTransaction, item: &NewStockItem) -> Result<ClaimOutcome> {
    let Some(entry) = tx.catalog_entry_for_update(item.sku).await? else {
        return Err(LedgerError::InvalidSku);
    };

    if let Some(owner) = entry.owner.filter(|owner| *owner != item.owner) {
        tracing::info!(
            sku = %item.sku,
            owner = %owner,
            user_id = %item.owner,
            "SKU already claimed by another user"
        );
        return Err(LedgerError::AlreadyClaimed);
    }

    Ok(tx.upsert_item(item).await?)
}

impl StockOperations for StockLedger {
    fn add_item<'a>(&'a self, item: &'a NewStockItem) -> LedgerFuture<'a, ClaimOutcome> {
        Box::pin(async move {
            let mut tx = self.store.begin().await?;

            let outcome = match claim(tx.as_mut(), item).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        tracing::warn!(sku = %item.sku, error = %rollback, "Rollback failed");
                    }
                    return Err(e);
                }
            };
            tx.commit().await?;

            tracing::info!(
                sku = %item.sku,
                user_id = %item.owner,
                count = item.count,
                outcome = ?outcome,
                "Stock item saved"
            );
            self.events
                .emit(&DomainEvent::stock_item(outcome, item, self.clock.now()));
            Ok(outcome)
        })
    }

    fn delete_item(&self, sku: Sku) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            if self.store.delete(sku).await? == 0 {
                return Err(LedgerError::NotFound);
            }
            tracing::info!(sku = %sku, "Stock item deleted");
            Ok(())
        })
    }

    fn get_item_by_sku(&self, sku: Sku) -> LedgerFuture<'_, StockItem> {
        Box::pin(async move { self.store.get(sku).await?.ok_or(LedgerError::NotFound) })
    }

    fn list_by_location<'a>(&'a self, query: &'a LocationQuery) -> LedgerFuture<'a, StockPage> {
        Box::pin(async move {
            let (items, total_count) = self.store.list_by_location(query).await?;
            Ok(StockPage {
                items,
                total_count,
                page_number: query.current_page,
                total_pages: query.total_pages(total_count),
            })
        })
    }
}

impl StockLookup for StockLedger {
    fn get_stock(&self, sku: Sku) -> LedgerFuture<'_, StockItem> {
        self.get_item_by_sku(sku)
    }
}
