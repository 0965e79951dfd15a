//! In-memory store doubles.
//!
//! - [`InMemoryStockStore`]: catalog plus inventory; a claim transaction holds
//!   one store-wide lock, so concurrent claims serialize like the row lock does
//! - [`InMemoryCartStore`]: cart lines keyed by `(user, sku)`; an optional write
//!   delay widens the read-then-write window of a reservation

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use stockcart_core::store::{CartStore, StockStore, StockTransaction, StoreError, StoreFuture};
use stockcart_core::{
    CartLine, ClaimOutcome, LocationQuery, NewStockItem, Sku, SkuCatalogEntry, StockItem, UserId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone)]
struct CatalogRow {
    name: String,
    kind: String,
}

#[derive(Debug, Clone)]
struct ItemRow {
    owner: UserId,
    count: u32,
    price: u32,
    location: String,
}

#[derive(Debug, Default)]
struct StockState {
    catalog: BTreeMap<Sku, CatalogRow>,
    items: BTreeMap<Sku, ItemRow>,
}

impl StockState {
    fn joined(&self, sku: Sku, row: &ItemRow) -> StockItem {
        let catalog = self.catalog.get(&sku);
        StockItem {
            sku,
            owner: Some(row.owner),
            count: row.count,
            price: row.price,
            location: row.location.clone(),
            name: catalog.map(|c| c.name.clone()).unwrap_or_default(),
            kind: catalog.map(|c| c.kind.clone()).unwrap_or_default(),
        }
    }

    fn apply(&mut self, item: &NewStockItem) -> Result<(), StoreError> {
        match self.items.get_mut(&item.sku) {
            Some(row) => {
                row.count = row
                    .count
                    .checked_add(item.count)
                    .ok_or(StoreError::CountOutOfRange)?;
                row.owner = item.owner;
                row.price = item.price;
                row.location.clone_from(&item.location);
            }
            None => {
                self.items.insert(
                    item.sku,
                    ItemRow {
                        owner: item.owner,
                        count: item.count,
                        price: item.price,
                        location: item.location.clone(),
                    },
                );
            }
        }
        Ok(())
    }
}

fn injected() -> StoreError {
    StoreError::Database("injected failure".to_string())
}

/// In-memory catalog and inventory.
///
/// # Example
///
/// ```
/// use stockcart_testing::InMemoryStockStore;
/// use stockcart_core::Sku;
///
/// # async fn example() {
/// let store = InMemoryStockStore::new();
/// store.add_catalog_entry(Sku(1001), "t-shirt", "apparel").await;
/// assert!(store.item(Sku(1001)).await.is_none());
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStockStore {
    state: Arc<Mutex<StockState>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryStockStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a SKU in the catalog.
    pub async fn add_catalog_entry(&self, sku: Sku, name: &str, kind: &str) {
        self.state.lock().await.catalog.insert(
            sku,
            CatalogRow {
                name: name.to_string(),
                kind: kind.to_string(),
            },
        );
    }

    /// Current inventory row, joined with the catalog.
    pub async fn item(&self, sku: Sku) -> Option<StockItem> {
        let state = self.state.lock().await;
        state.items.get(&sku).map(|row| state.joined(sku, row))
    }

    /// Make every subsequent call fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(injected())
        } else {
            Ok(())
        }
    }
}

impl StockStore for InMemoryStockStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn StockTransaction>> {
        Box::pin(async move {
            self.check()?;
            let guard = Arc::clone(&self.state).lock_owned().await;
            Ok(Box::new(InMemoryStockTransaction {
                guard,
                staged: Vec::new(),
                failing: Arc::clone(&self.failing),
            }) as Box<dyn StockTransaction>)
        })
    }

    fn delete(&self, sku: Sku) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            self.check()?;
            let removed = self.state.lock().await.items.remove(&sku);
            Ok(u64::from(removed.is_some()))
        })
    }

    fn get(&self, sku: Sku) -> StoreFuture<'_, Option<StockItem>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.item(sku).await)
        })
    }

    fn list_by_location<'a>(
        &'a self,
        query: &'a LocationQuery,
    ) -> StoreFuture<'a, (Vec<StockItem>, u64)> {
        Box::pin(async move {
            self.check()?;
            let state = self.state.lock().await;
            let matching: Vec<StockItem> = state
                .items
                .iter()
                .filter(|(_, row)| row.owner == query.user_id && row.location == query.location)
                .map(|(sku, row)| state.joined(*sku, row))
                .collect();
            let total = matching.len() as u64;
            let page = matching
                .into_iter()
                .skip(usize::try_from(query.offset()).unwrap())
                .take(query.page_size as usize)
                .collect();
            Ok((page, total))
        })
    }

    fn upsert_catalog_entry<'a>(
        &'a self,
        sku: Sku,
        name: &'a str,
        kind: &'a str,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check()?;
            self.add_catalog_entry(sku, name, kind).await;
            Ok(())
        })
    }
}

/// A claim transaction holding the store-wide lock until commit or drop.
pub struct InMemoryStockTransaction {
    guard: OwnedMutexGuard<StockState>,
    staged: Vec<NewStockItem>,
    failing: Arc<AtomicBool>,
}

impl StockTransaction for InMemoryStockTransaction {
    fn catalog_entry_for_update(&mut self, sku: Sku) -> StoreFuture<'_, Option<SkuCatalogEntry>> {
        Box::pin(async move {
            let Some(catalog) = self.guard.catalog.get(&sku) else {
                return Ok(None);
            };
            let owner = self
                .staged
                .iter()
                .rev()
                .find(|item| item.sku == sku)
                .map(|item| item.owner)
                .or_else(|| self.guard.items.get(&sku).map(|row| row.owner));
            Ok(Some(SkuCatalogEntry {
                sku,
                name: catalog.name.clone(),
                kind: catalog.kind.clone(),
                owner,
            }))
        })
    }

    fn upsert_item<'a>(&'a mut self, item: &'a NewStockItem) -> StoreFuture<'a, ClaimOutcome> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(injected());
            }
            let exists = self.guard.items.contains_key(&item.sku)
                || self.staged.iter().any(|staged| staged.sku == item.sku);
            self.staged.push(item.clone());
            Ok(if exists {
                ClaimOutcome::Changed
            } else {
                ClaimOutcome::Created
            })
        })
    }

    fn commit(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move {
            let mut this = *self;
            if this.failing.load(Ordering::SeqCst) {
                return Err(injected());
            }
            for item in &this.staged {
                this.guard.apply(item)?;
            }
            Ok(())
        })
    }

    fn rollback(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move {
            drop(self);
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct CartRow {
    id: i64,
    count: u32,
}

/// In-memory cart lines.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCartStore {
    lines: Arc<RwLock<BTreeMap<(UserId, Sku), CartRow>>>,
    next_id: Arc<AtomicI64>,
    failing: Arc<AtomicBool>,
    write_delay: Option<Duration>,
}

impl InMemoryCartStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` before every `add_line` write.
    #[must_use]
    pub const fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Reserved count for `(user, sku)`, if a line exists.
    #[must_use]
    pub fn count(&self, user_id: UserId, sku: Sku) -> Option<u32> {
        self.lines
            .read()
            .unwrap()
            .get(&(user_id, sku))
            .map(|row| row.count)
    }

    /// Seed a line directly, bypassing the ledger.
    pub fn insert(&self, line: CartLine) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.lines.write().unwrap().insert(
            (line.user_id, line.sku),
            CartRow {
                id,
                count: line.count,
            },
        );
    }

    /// Make every subsequent call fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(injected())
        } else {
            Ok(())
        }
    }
}

impl CartStore for InMemoryCartStore {
    fn line_count(&self, user_id: UserId, sku: Sku) -> StoreFuture<'_, u32> {
        Box::pin(async move {
            self.check()?;
            Ok(self.count(user_id, sku).unwrap_or(0))
        })
    }

    fn add_line<'a>(&'a self, line: &'a CartLine) -> StoreFuture<'a, i64> {
        Box::pin(async move {
            self.check()?;
            if let Some(delay) = self.write_delay {
                tokio::time::sleep(delay).await;
            }
            let mut lines = self.lines.write().unwrap();
            if let Some(row) = lines.get_mut(&(line.user_id, line.sku)) {
                row.count = row
                    .count
                    .checked_add(line.count)
                    .ok_or(StoreError::CountOutOfRange)?;
                return Ok(row.id);
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            lines.insert(
                (line.user_id, line.sku),
                CartRow {
                    id,
                    count: line.count,
                },
            );
            Ok(id)
        })
    }

    fn lines(&self, user_id: UserId) -> StoreFuture<'_, Vec<CartLine>> {
        Box::pin(async move {
            self.check()?;
            Ok(self
                .lines
                .read()
                .unwrap()
                .iter()
                .filter(|((user, _), _)| *user == user_id)
                .map(|((user, sku), row)| CartLine {
                    user_id: *user,
                    sku: *sku,
                    count: row.count,
                })
                .collect())
        })
    }

    fn delete_line(&self, user_id: UserId, sku: Sku) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            self.check()?;
            let removed = self.lines.write().unwrap().remove(&(user_id, sku));
            Ok(u64::from(removed.is_some()))
        })
    }

    fn clear(&self, user_id: UserId) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            self.check()?;
            let mut lines = self.lines.write().unwrap();
            let before = lines.len();
            lines.retain(|(user, _), _| *user != user_id);
            Ok((before - lines.len()) as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(owner: i64, sku: u32, count: u32) -> NewStockItem {
        NewStockItem {
            owner: UserId(owner),
            sku: Sku(sku),
            count,
            price: 100,
            location: "A1".to_string(),
        }
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = InMemoryStockStore::new();
        store.add_catalog_entry(Sku(1), "widget", "tools").await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.upsert_item(&claim(7, 1, 5)).await.unwrap();
        }

        assert!(store.item(Sku(1)).await.is_none());
    }

    #[tokio::test]
    async fn commit_applies_additive_upsert() {
        let store = InMemoryStockStore::new();
        store.add_catalog_entry(Sku(1), "widget", "tools").await;

        for _ in 0..2 {
            let mut tx = store.begin().await.unwrap();
            tx.upsert_item(&claim(7, 1, 5)).await.unwrap();
            tx.commit().await.unwrap();
        }

        let item = store.item(Sku(1)).await.unwrap();
        assert_eq!(item.count, 10);
        assert_eq!(item.name, "widget");
    }

    #[tokio::test]
    async fn cart_line_past_u32_is_rejected() {
        let store = InMemoryCartStore::new();
        let line = CartLine {
            user_id: UserId(1),
            sku: Sku(1),
            count: 3_000_000_000,
        };
        store.add_line(&line).await.unwrap();

        assert!(matches!(
            store.add_line(&line).await,
            Err(StoreError::CountOutOfRange)
        ));
        assert_eq!(store.count(UserId(1), Sku(1)), Some(3_000_000_000));
    }

    #[tokio::test]
    async fn clear_reports_rows_removed() {
        let store = InMemoryCartStore::new();
        store.insert(CartLine {
            user_id: UserId(1),
            sku: Sku(1),
            count: 2,
        });
        store.insert(CartLine {
            user_id: UserId(1),
            sku: Sku(2),
            count: 1,
        });
        store.insert(CartLine {
            user_id: UserId(2),
            sku: Sku(1),
            count: 1,
        });

        assert_eq!(store.clear(UserId(1)).await.unwrap(), 2);
        assert_eq!(store.clear(UserId(1)).await.unwrap(), 0);
        assert_eq!(store.count(UserId(2), Sku(1)), Some(1));
    }
}
