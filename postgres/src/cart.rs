//! `PostgreSQL` cart line store.

use crate::{to_u32, write_error};
use sqlx::PgPool;
use stockcart_core::store::{CartStore, StoreError, StoreFuture};
use stockcart_core::{CartLine, Sku, UserId};

/// `PostgreSQL` implementation of [`CartStore`].
#[derive(Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the cart database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations/cart")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

impl CartStore for PostgresCartStore {
    fn line_count(&self, user_id: UserId, sku: Sku) -> StoreFuture<'_, u32> {
        Box::pin(async move {
            let count: Option<(i64,)> =
                sqlx::query_as("SELECT count FROM cart WHERE user_id = $1 AND sku = $2")
                    .bind(user_id.0)
                    .bind(i64::from(sku.0))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| StoreError::Database(format!("Failed to read cart line: {e}")))?;
            count.map_or(Ok(0), |(count,)| to_u32("count", count))
        })
    }

    fn add_line<'a>(&'a self, line: &'a CartLine) -> StoreFuture<'a, i64> {
        Box::pin(async move {
            let (id,): (i64,) = sqlx::query_as(
                r"
                INSERT INTO cart (user_id, sku, count)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, sku)
                DO UPDATE SET count = cart.count + EXCLUDED.count
                RETURNING cart.id
                ",
            )
            .bind(line.user_id.0)
            .bind(i64::from(line.sku.0))
            .bind(i64::from(line.count))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error("Failed to add cart line", &e))?;
            Ok(id)
        })
    }

    fn lines(&self, user_id: UserId) -> StoreFuture<'_, Vec<CartLine>> {
        Box::pin(async move {
            let rows: Vec<(i64, i64)> =
                sqlx::query_as("SELECT sku, count FROM cart WHERE user_id = $1 ORDER BY sku")
                    .bind(user_id.0)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| StoreError::Database(format!("Failed to list cart: {e}")))?;

            rows.into_iter()
                .map(|(sku, count)| {
                    Ok(CartLine {
                        user_id,
                        sku: Sku(to_u32("sku", sku)?),
                        count: to_u32("count", count)?,
                    })
                })
                .collect()
        })
    }

    fn delete_line(&self, user_id: UserId, sku: Sku) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM cart WHERE user_id = $1 AND sku = $2")
                .bind(user_id.0)
                .bind(i64::from(sku.0))
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to delete cart line: {e}")))?;
            Ok(result.rows_affected())
        })
    }

    fn clear(&self, user_id: UserId) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM cart WHERE user_id = $1")
                .bind(user_id.0)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to clear cart: {e}")))?;
            Ok(result.rows_affected())
        })
    }
}
