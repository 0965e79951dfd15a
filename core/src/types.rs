//! Domain types for stock items, catalog entries, and cart lines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stock-keeping unit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(pub u32);

impl Sku {
    /// Decimal form used as the event bus partition key.
    #[must_use]
    pub fn partition_key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier shared by both services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inventory row joined with its catalog display fields.
///
/// This is also the wire shape returned by `GET /api/stocks/:sku`, which the cart
/// service consumes through its remote lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    /// The SKU this row describes
    pub sku: Sku,
    /// Recorded owner; `None` means unclaimed
    #[serde(rename = "user_id", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
    /// Units on hand
    pub count: u32,
    /// Unit price
    pub price: u32,
    /// Storage location
    pub location: String,
    /// Catalog name (empty when the catalog row is missing)
    #[serde(default)]
    pub name: String,
    /// Catalog type (empty when the catalog row is missing)
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A request to claim or top up inventory for a SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockItem {
    /// Claiming user
    pub owner: UserId,
    /// Target SKU
    pub sku: Sku,
    /// Units to add
    pub count: u32,
    /// New unit price (last writer wins)
    pub price: u32,
    /// New location (last writer wins)
    pub location: String,
}

/// A catalog entry with the owner projected from the inventory row, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuCatalogEntry {
    /// Catalog key
    pub sku: Sku,
    /// Display name
    pub name: String,
    /// Catalog type
    pub kind: String,
    /// Current owner from the inventory row (read-only projection)
    pub owner: Option<UserId>,
}

/// Whether a stock upsert inserted a row or modified an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// No row existed; it was inserted
    Created,
    /// An existing row was updated additively
    Changed,
}

/// Parameters for a paginated listing of a user's items at a location.
///
/// `page_size` and `current_page` are validated (>= 1) before reaching the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    /// Owner filter
    pub user_id: UserId,
    /// Location filter
    pub location: String,
    /// Items per page
    pub page_size: u32,
    /// 1-based page number
    pub current_page: u32,
}

impl LocationQuery {
    /// Row offset of the requested page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.current_page.saturating_sub(1) as u64) * self.page_size as u64
    }

    /// Number of pages needed for `total_count` rows (`ceil(total / page_size)`).
    #[must_use]
    pub const fn total_pages(&self, total_count: u64) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        total_count.div_ceil(self.page_size as u64)
    }
}

/// One page of a location listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPage {
    /// Items on this page, ascending by SKU
    pub items: Vec<StockItem>,
    /// Total matching rows across all pages
    pub total_count: u64,
    /// The page that was requested
    pub page_number: u32,
    /// `ceil(total_count / page_size)`
    pub total_pages: u64,
}

/// A reserved quantity for one user and SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    /// Cart owner
    pub user_id: UserId,
    /// Reserved SKU
    pub sku: Sku,
    /// Reserved units (> 0 whenever the row exists)
    pub count: u32,
}

/// A request to reserve `count` more units of `sku` for `user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reserving user
    pub user_id: UserId,
    /// Requested SKU
    pub sku: Sku,
    /// Additional units requested
    pub count: u32,
}

/// A cart line enriched with live stock data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemView {
    /// SKU
    pub sku: Sku,
    /// Reserved units
    pub count: u32,
    /// Current catalog name
    pub name: String,
    /// Current stock price (no price snapshot is kept)
    pub price: u32,
}

/// Result of listing a user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartListing {
    /// Lines whose stock lookup succeeded
    pub items: Vec<CartItemView>,
    /// Sum of `count * price` over `items`
    pub total_price: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn query(page_size: u32, current_page: u32) -> LocationQuery {
        LocationQuery {
            user_id: UserId(1),
            location: "warehouse-a".to_string(),
            page_size,
            current_page,
        }
    }

    #[test]
    fn pagination_of_twenty_five_items() {
        let q = query(10, 1);
        assert_eq!(q.total_pages(25), 3);
        assert_eq!(q.offset(), 0);
        assert_eq!(query(10, 3).offset(), 20);
    }

    #[test]
    fn empty_listing_has_zero_pages() {
        assert_eq!(query(10, 1).total_pages(0), 0);
    }

    #[test]
    fn stock_item_wire_names() {
        let item = StockItem {
            sku: Sku(1001),
            owner: Some(UserId(7)),
            count: 3,
            price: 250,
            location: "A1".to_string(),
            name: "t-shirt".to_string(),
            kind: "apparel".to_string(),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["sku"], 1001);
        assert_eq!(json["user_id"], 7);
        assert_eq!(json["type"], "apparel");

        let unclaimed = StockItem { owner: None, ..item };
        let json = serde_json::to_value(&unclaimed).unwrap();
        assert!(json.get("user_id").is_none());
    }

    proptest! {
        #[test]
        fn pages_cover_all_rows(total in 0u64..10_000, page_size in 1u32..500) {
            let q = query(page_size, 1);
            let pages = q.total_pages(total);
            prop_assert!(pages * u64::from(page_size) >= total);
            if total > 0 {
                prop_assert!((pages - 1) * u64::from(page_size) < total);
            }
        }
    }
}
