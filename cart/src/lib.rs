//! # Stockcart Cart
//!
//! The cart ledger owns per-(user, SKU) reserved quantities.
//!
//! - [`CartLedger`]: reservation, listing, deletion, clearing
//! - [`InstrumentedCart`]: tracing span and metrics per operation
//! - [`HttpStockLookup`]: reads stock from the stock service with a bounded deadline

mod client;
mod instrumented;
mod ledger;

pub use client::HttpStockLookup;
pub use instrumented::InstrumentedCart;
pub use ledger::{CartLedger, DEFAULT_LOOKUP_DEADLINE};
