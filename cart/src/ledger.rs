//! Cart ledger and the reservation protocol.
//!
//! `add_item_to_cart` runs four steps against two independent stores:
//!
//! 1. read the SKU's stock row from the stock service (bounded deadline)
//! 2. read the caller's reserved count for the SKU
//! 3. admit only if `stock.count >= requested + reserved`
//! 4. on admission, add to the cart line
//!
//! One audit event is emitted either way.
//!
//! # Consistency
//!
//! Steps 1 to 4 are not atomic and nothing here makes them so. Two reservations
//! for the same SKU (same user or not) can read the same stock snapshot and
//! both be admitted, so the sum of reservations may exceed physical stock.
//! Reservations are advisory; the stock ledger stays the source of truth for
//! inventory. There is also no two-phase commit with the event bus: a crash
//! after the cart write loses the event but keeps the line.

use std::sync::Arc;
use std::time::Duration;

use stockcart_core::environment::Clock;
use stockcart_core::event::INSUFFICIENT_STOCK_REASON;
use stockcart_core::ledger::{CartOperations, LedgerFuture, StockLookup};
use stockcart_core::store::CartStore;
use stockcart_core::{
    CartItemView, CartLine, CartListing, DomainEvent, LedgerError, Reservation, Result, Sku,
    StockItem, UserId,
};
use stockcart_runtime::EventEmitter;

/// Deadline for one stock lookup; shorter than the 5s request deadline.
pub const DEFAULT_LOOKUP_DEADLINE: Duration = Duration::from_secs(3);

/// Per-user reservations backed by a [`CartStore`].
#[derive(Clone)]
pub struct CartLedger {
    store: Arc<dyn CartStore>,
    stock: Arc<dyn StockLookup>,
    events: Arc<EventEmitter>,
    clock: Arc<dyn Clock>,
    lookup_deadline: Duration,
}

impl CartLedger {
    /// Create a ledger with the default lookup deadline.
    #[must_use]
    pub fn new(
        store: Arc<dyn CartStore>,
        stock: Arc<dyn StockLookup>,
        events: Arc<EventEmitter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            stock,
            events,
            clock,
            lookup_deadline: DEFAULT_LOOKUP_DEADLINE,
        }
    }

    /// Override the stock lookup deadline.
    #[must_use]
    pub const fn with_lookup_deadline(mut self, deadline: Duration) -> Self {
        self.lookup_deadline = deadline;
        self
    }

    async fn lookup(&self, sku: Sku) -> Result<StockItem> {
        match tokio::time::timeout(self.lookup_deadline, self.stock.get_stock(sku)).await {
            Ok(Ok(item)) => Ok(item),
            Ok(Err(LedgerError::NotFound | LedgerError::InvalidSku)) => Err(LedgerError::InvalidSku),
            Ok(Err(LedgerError::Timeout)) | Err(_) => {
                tracing::warn!(sku = %sku, deadline_ms = self.lookup_deadline.as_millis(), "Stock lookup timed out");
                Err(LedgerError::Timeout)
            }
            Ok(Err(e)) => Err(LedgerError::Internal(format!("stock lookup failed: {e}"))),
        }
    }
}

impl CartOperations for CartLedger {
    fn add_item_to_cart(&self, reservation: Reservation) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            let stock = self.lookup(reservation.sku).await?;
            let reserved = self
                .store
                .line_count(reservation.user_id, reservation.sku)
                .await?;

            let wanted = u64::from(reservation.count) + u64::from(reserved);
            if u64::from(stock.count) < wanted {
                tracing::info!(
                    user_id = %reservation.user_id,
                    sku = %reservation.sku,
                    requested = reservation.count,
                    reserved,
                    available = stock.count,
                    "Reservation rejected"
                );
                self.events.emit(&DomainEvent::cart_item_failed(
                    &reservation,
                    stock.price,
                    INSUFFICIENT_STOCK_REASON,
                    self.clock.now(),
                ));
                return Err(LedgerError::InsufficientStock);
            }

            let cart_id = self
                .store
                .add_line(&CartLine {
                    user_id: reservation.user_id,
                    sku: reservation.sku,
                    count: reservation.count,
                })
                .await?;

            tracing::info!(
                user_id = %reservation.user_id,
                sku = %reservation.sku,
                count = reservation.count,
                cart_id,
                "Reservation admitted"
            );
            self.events.emit(&DomainEvent::cart_item_added(
                &reservation,
                stock.price,
                cart_id,
                self.clock.now(),
            ));
            Ok(())
        })
    }

    fn delete_item_from_cart(&self, user_id: UserId, sku: Sku) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            if self.store.delete_line(user_id, sku).await? == 0 {
                return Err(LedgerError::NotFound);
            }
            Ok(())
        })
    }

    fn list_cart_items(&self, user_id: UserId) -> LedgerFuture<'_, CartListing> {
        Box::pin(async move {
            let lines = self.store.lines(user_id).await?;
            let mut listing = CartListing::default();

            for line in lines {
                let stock = match self.lookup(line.sku).await {
                    Ok(stock) => stock,
                    Err(e) => {
                        tracing::warn!(user_id = %user_id, sku = %line.sku, error = %e, "Skipping cart line");
                        continue;
                    }
                };

                let subtotal = u64::from(line.count) * u64::from(stock.price);
                listing.total_price = listing
                    .total_price
                    .checked_add(subtotal)
                    .ok_or_else(|| LedgerError::Internal("cart total overflow".to_string()))?;
                listing.items.push(CartItemView {
                    sku: line.sku,
                    count: line.count,
                    name: stock.name,
                    price: stock.price,
                });
            }

            Ok(listing)
        })
    }

    fn clear_cart(&self, user_id: UserId) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            let removed = self.store.clear(user_id).await?;
            if removed == 0 {
                return Err(LedgerError::NotFound);
            }
            tracing::info!(user_id = %user_id, removed, "Cart cleared");
            Ok(())
        })
    }
}
