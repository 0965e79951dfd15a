//! # Stockcart Runtime
//!
//! Process-level machinery shared by the stock and cart services:
//!
//! - [`emitter::EventEmitter`]: hands domain events to a background publisher
//!   without blocking the write path, and drains outstanding sends on shutdown
//! - [`metrics::MetricsServer`]: installs the Prometheus recorder
//!
//! # Example
//!
//! ```ignore
//! let bus: Arc<dyn EventBus> = Arc::new(RedpandaEventBus::new(&brokers)?);
//! let emitter = Arc::new(EventEmitter::new(bus, "ledger-events", 1024));
//!
//! // ... serve requests; ledgers call emitter.emit(&event) ...
//!
//! emitter.close(Duration::from_secs(5)).await?;
//! ```

pub mod emitter;
pub mod metrics;

pub use emitter::{EmitterError, EventEmitter};
pub use metrics::{MetricsError, MetricsServer};
