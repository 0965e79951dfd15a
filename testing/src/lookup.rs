//! Scripted stock lookup for cart tests.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use stockcart_core::ledger::{LedgerFuture, StockLookup};
use stockcart_core::{LedgerError, Sku, StockItem};

/// A [`StockLookup`] answering from a fixed table.
///
/// Unknown SKUs answer `NotFound`. A per-call delay simulates a slow stock
/// service for deadline tests.
#[derive(Clone, Debug, Default)]
pub struct ScriptedStockLookup {
    answers: Arc<RwLock<HashMap<Sku, Result<StockItem, LedgerError>>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ScriptedStockLookup {
    /// Create a lookup with no answers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` before every answer.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer `item` for its SKU.
    pub fn set_stock(&self, item: StockItem) {
        self.answers.write().unwrap().insert(item.sku, Ok(item));
    }

    /// Answer `error` for `sku`.
    pub fn set_error(&self, sku: Sku, error: LedgerError) {
        self.answers.write().unwrap().insert(sku, Err(error));
    }

    /// Number of lookups performed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StockLookup for ScriptedStockLookup {
    fn get_stock(&self, sku: Sku) -> LedgerFuture<'_, StockItem> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answers
                .read()
                .unwrap()
                .get(&sku)
                .cloned()
                .unwrap_or(Err(LedgerError::NotFound))
        })
    }
}
