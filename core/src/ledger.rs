//! Ledger interfaces consumed by transports and by the other service.

use crate::error::LedgerError;
use crate::types::{
    CartListing, ClaimOutcome, LocationQuery, NewStockItem, Reservation, Sku, StockItem,
    StockPage, UserId,
};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by ledger methods.
pub type LedgerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LedgerError>> + Send + 'a>>;

/// Authoritative per-SKU inventory.
pub trait StockOperations: Send + Sync {
    /// Claim a SKU or add to its count.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidSku`] if the SKU is not in the catalog
    /// - [`LedgerError::AlreadyClaimed`] if another user owns it
    /// - [`LedgerError::Internal`] on store failure
    fn add_item<'a>(&'a self, item: &'a NewStockItem) -> LedgerFuture<'a, ClaimOutcome>;

    /// Delete the inventory row.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if no row was deleted.
    fn delete_item(&self, sku: Sku) -> LedgerFuture<'_, ()>;

    /// Point lookup with catalog display fields.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if absent.
    fn get_item_by_sku(&self, sku: Sku) -> LedgerFuture<'_, StockItem>;

    /// One page of a user's items at a location.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Internal`] on store failure.
    fn list_by_location<'a>(&'a self, query: &'a LocationQuery) -> LedgerFuture<'a, StockPage>;
}

/// Per-user reservations.
pub trait CartOperations: Send + Sync {
    /// Reserve more units of a SKU.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidSku`] if the stock service does not know the SKU
    /// - [`LedgerError::Timeout`] if the stock query exceeded its deadline
    /// - [`LedgerError::InsufficientStock`] if the reservation was rejected
    fn add_item_to_cart(&self, reservation: Reservation) -> LedgerFuture<'_, ()>;

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if the line did not exist.
    fn delete_item_from_cart(&self, user_id: UserId, sku: Sku) -> LedgerFuture<'_, ()>;

    /// List lines enriched with live stock data.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Internal`] if the lines cannot be read.
    fn list_cart_items(&self, user_id: UserId) -> LedgerFuture<'_, CartListing>;

    /// Remove every line for a user.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if the cart was already empty.
    fn clear_cart(&self, user_id: UserId) -> LedgerFuture<'_, ()>;
}

/// Read access to stock from the cart side.
///
/// Implemented in-process by `StockLedger` and remotely by `HttpStockLookup`.
pub trait StockLookup: Send + Sync {
    /// Current stock row for `sku`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] if the SKU has no stock row
    /// - [`LedgerError::Timeout`] if the query exceeded its deadline
    fn get_stock(&self, sku: Sku) -> LedgerFuture<'_, StockItem>;
}
