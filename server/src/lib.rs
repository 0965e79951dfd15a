//! Process wiring shared by the stockcart binaries.
//!
//! - [`config`]: environment-driven configuration
//! - [`telemetry`]: `tracing` subscriber and the `/metrics` listener
//! - [`http`]: serving a router and draining the emitter afterwards
//! - [`shutdown`]: Ctrl+C / SIGTERM fan-out to every listener
//! - [`audit`]: the audit consumer's record handler
//! - [`catalog`]: SKU catalog seeding for the stock service

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod catalog;
pub mod config;
pub mod http;
pub mod shutdown;
pub mod telemetry;

pub use config::Config;
