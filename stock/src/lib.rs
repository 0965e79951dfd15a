//! # Stockcart Stock
//!
//! The stock ledger owns authoritative per-SKU inventory and the SKU catalog.
//!
//! - [`StockLedger`]: claim/upsert, point lookup, paginated listing, delete
//! - [`InstrumentedStock`]: wraps any [`StockOperations`](stockcart_core::ledger::StockOperations)
//!   with a tracing span and operation metrics
//!
//! `StockLedger` also implements [`StockLookup`](stockcart_core::ledger::StockLookup),
//! so a cart ledger can run in the same process without the HTTP hop.

mod instrumented;
mod ledger;

pub use instrumented::InstrumentedStock;
pub use ledger::StockLedger;
