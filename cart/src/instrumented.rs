//! Tracing and metrics around a cart ledger.

use stockcart_core::ledger::{CartOperations, LedgerFuture};
use stockcart_core::{CartListing, Reservation, Sku, UserId};
use stockcart_runtime::metrics::observe;
use tracing::Instrument;

const SERVICE: &str = "cart";

/// Wraps a [`CartOperations`] with one span and one metrics sample per call.
#[derive(Clone)]
pub struct InstrumentedCart<L> {
    inner: L,
}

impl<L> InstrumentedCart<L> {
    /// Wrap `inner`.
    #[must_use]
    pub const fn new(inner: L) -> Self {
        Self { inner }
    }
}

impl<L: CartOperations> CartOperations for InstrumentedCart<L> {
    fn add_item_to_cart(&self, reservation: Reservation) -> LedgerFuture<'_, ()> {
        let span = tracing::info_span!(
            "cart.add_item_to_cart",
            user_id = %reservation.user_id,
            sku = %reservation.sku,
            count = reservation.count,
        );
        Box::pin(
            observe(SERVICE, "add_item_to_cart", self.inner.add_item_to_cart(reservation))
                .instrument(span),
        )
    }

    fn delete_item_from_cart(&self, user_id: UserId, sku: Sku) -> LedgerFuture<'_, ()> {
        let span = tracing::info_span!("cart.delete_item_from_cart", user_id = %user_id, sku = %sku);
        Box::pin(
            observe(
                SERVICE,
                "delete_item_from_cart",
                self.inner.delete_item_from_cart(user_id, sku),
            )
            .instrument(span),
        )
    }

    fn list_cart_items(&self, user_id: UserId) -> LedgerFuture<'_, CartListing> {
        let span = tracing::info_span!("cart.list_cart_items", user_id = %user_id);
        Box::pin(
            observe(SERVICE, "list_cart_items", self.inner.list_cart_items(user_id))
                .instrument(span),
        )
    }

    fn clear_cart(&self, user_id: UserId) -> LedgerFuture<'_, ()> {
        let span = tracing::info_span!("cart.clear_cart", user_id = %user_id);
        Box::pin(observe(SERVICE, "clear_cart", self.inner.clear_cart(user_id)).instrument(span))
    }
}
