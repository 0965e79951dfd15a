//! Persistence ports for the two ledgers.
//!
//! Each ledger owns its store exclusively. The stock store exposes an explicit
//! transaction because the ownership check and the upsert of a claim must be
//! atomic; nothing on the cart side is.

use crate::types::{
    CartLine, ClaimOutcome, LocationQuery, NewStockItem, Sku, SkuCatalogEntry, StockItem, UserId,
};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors raised by store adapters.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Driver or connection failure
    #[error("Database error: {0}")]
    Database(String),

    /// A row could not be mapped onto a domain type
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// An additive write would push a count past `u32::MAX`
    #[error("count out of range")]
    CountOutOfRange,
}

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Inventory and catalog persistence.
pub trait StockStore: Send + Sync {
    /// Open a transaction for a claim.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if no transaction could be started.
    fn begin(&self) -> StoreFuture<'_, Box<dyn StockTransaction>>;

    /// Delete the inventory row for `sku`, returning the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn delete(&self, sku: Sku) -> StoreFuture<'_, u64>;

    /// Point lookup joined with the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn get(&self, sku: Sku) -> StoreFuture<'_, Option<StockItem>>;

    /// One page of `(user, location)` items ascending by SKU, plus the total
    /// number of matching rows. Both are read in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn list_by_location<'a>(
        &'a self,
        query: &'a LocationQuery,
    ) -> StoreFuture<'a, (Vec<StockItem>, u64)>;

    /// Insert or rename a catalog entry. Claims are only accepted for
    /// catalogued SKUs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn upsert_catalog_entry<'a>(
        &'a self,
        sku: Sku,
        name: &'a str,
        kind: &'a str,
    ) -> StoreFuture<'a, ()>;
}

/// An open claim transaction.
///
/// Dropping without `commit` discards every write.
pub trait StockTransaction: Send {
    /// Lock the catalog entry for `sku` and read its current owner.
    ///
    /// Returns `None` if the SKU is not in the catalog. While the transaction
    /// is open, other claims of the same SKU wait on the lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn catalog_entry_for_update(&mut self, sku: Sku) -> StoreFuture<'_, Option<SkuCatalogEntry>>;

    /// Insert the inventory row, or add to its count and overwrite the other fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn upsert_item<'a>(&'a mut self, item: &'a NewStockItem) -> StoreFuture<'a, ClaimOutcome>;

    /// Make the writes durable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the commit fails; nothing is applied in that case.
    fn commit(self: Box<Self>) -> StoreFuture<'static, ()>;

    /// Discard the writes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn rollback(self: Box<Self>) -> StoreFuture<'static, ()>;
}

/// Cart line persistence.
pub trait CartStore: Send + Sync {
    /// Reserved count for `(user, sku)`, zero when no line exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn line_count(&self, user_id: UserId, sku: Sku) -> StoreFuture<'_, u32>;

    /// Insert the line or add to its count, returning the row id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn add_line<'a>(&'a self, line: &'a CartLine) -> StoreFuture<'a, i64>;

    /// All lines for a user, ascending by SKU.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn lines(&self, user_id: UserId) -> StoreFuture<'_, Vec<CartLine>>;

    /// Delete one line, returning the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn delete_line(&self, user_id: UserId, sku: Sku) -> StoreFuture<'_, u64>;

    /// Delete every line for a user, returning the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    fn clear(&self, user_id: UserId) -> StoreFuture<'_, u64>;
}
