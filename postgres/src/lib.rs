//! `PostgreSQL` stores for the stock and cart ledgers.
//!
//! The two ledgers are separate bounded contexts and normally live in separate
//! databases, each with its own migration set:
//!
//! - [`PostgresStockStore`]: `sku` catalog and `items` inventory; claims lock the
//!   catalog row (`SELECT ... FOR UPDATE`) and upsert with
//!   `INSERT ... ON CONFLICT ... RETURNING`, using `xmax` to tell an update from
//!   an insert
//! - [`PostgresCartStore`]: `cart` lines keyed by `(user_id, sku)`
//!
//! # Example
//!
//! ```ignore
//! use stockcart_postgres::{PoolSettings, PostgresStockStore, connect};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = connect(&PoolSettings::new("postgres://localhost/stock")).await?;
//!     let store = PostgresStockStore::new(pool);
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cart;
mod stock;

pub use cart::PostgresCartStore;
pub use stock::{PgStockTransaction, PostgresStockStore};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use stockcart_core::store::StoreError;

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Database URL
    pub url: String,
    /// Maximum connections
    pub max_connections: u32,
    /// Minimum idle connections
    pub min_connections: u32,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Idle timeout
    pub idle_timeout: Duration,
}

impl PoolSettings {
    /// Settings for `url` with default pool sizing.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the database cannot be reached.
pub async fn connect(settings: &PoolSettings) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.connect_timeout)
        .idle_timeout(settings.idle_timeout)
        .connect(&settings.url)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;

    tracing::info!(
        max_connections = settings.max_connections,
        "Database pool ready"
    );
    Ok(pool)
}

/// Check constraints that bound additive counts to `u32`.
const COUNT_BOUNDS: [&str; 2] = ["items_count_max", "cart_count_max"];

/// Map a failed write, surfacing count-bound violations as
/// [`StoreError::CountOutOfRange`].
fn write_error(action: &str, e: &sqlx::Error) -> StoreError {
    let count_bound = e
        .as_database_error()
        .and_then(|db| db.constraint())
        .is_some_and(|name| COUNT_BOUNDS.contains(&name));
    if count_bound {
        StoreError::CountOutOfRange
    } else {
        StoreError::Database(format!("{action}: {e}"))
    }
}

/// Map a `BIGINT` column onto a `u32` domain field.
fn to_u32(column: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{column} value {value} out of range")))
}
