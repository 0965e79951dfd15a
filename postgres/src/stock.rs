//! `PostgreSQL` catalog and inventory store.

use crate::{to_u32, write_error};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use stockcart_core::store::{StockStore, StockTransaction, StoreError, StoreFuture};
use stockcart_core::{
    ClaimOutcome, LocationQuery, NewStockItem, Sku, SkuCatalogEntry, StockItem, UserId,
};

/// Inventory joined with catalog display fields.
const SELECT_ITEM: &str = r"
    SELECT i.user_id, i.sku, i.count, i.price, i.location,
           COALESCE(s.name, '') AS name, COALESCE(s.type, '') AS type
    FROM items i
    LEFT JOIN sku s ON i.sku = s.sku_id
";

/// `PostgreSQL` implementation of [`StockStore`].
#[derive(Clone)]
pub struct PostgresStockStore {
    pool: PgPool,
}

impl PostgresStockStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the stock database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations/stock")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

fn row_to_item(row: &PgRow) -> Result<StockItem, StoreError> {
    let read = |e: sqlx::Error| StoreError::InvalidData(e.to_string());
    Ok(StockItem {
        sku: Sku(to_u32("sku", row.try_get("sku").map_err(read)?)?),
        owner: Some(UserId(row.try_get("user_id").map_err(read)?)),
        count: to_u32("count", row.try_get("count").map_err(read)?)?,
        price: to_u32("price", row.try_get("price").map_err(read)?)?,
        location: row.try_get("location").map_err(read)?,
        name: row.try_get("name").map_err(read)?,
        kind: row.try_get("type").map_err(read)?,
    })
}

impl StockStore for PostgresStockStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn StockTransaction>> {
        Box::pin(async move {
            let tx = self
                .pool
                .begin()
                .await
                .map_err(|e| StoreError::Database(format!("Failed to start transaction: {e}")))?;
            Ok(Box::new(PgStockTransaction { tx }) as Box<dyn StockTransaction>)
        })
    }

    fn delete(&self, sku: Sku) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM items WHERE sku = $1")
                .bind(i64::from(sku.0))
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to delete item: {e}")))?;
            Ok(result.rows_affected())
        })
    }

    fn get(&self, sku: Sku) -> StoreFuture<'_, Option<StockItem>> {
        Box::pin(async move {
            let row = sqlx::query(&format!("{SELECT_ITEM} WHERE i.sku = $1"))
                .bind(i64::from(sku.0))
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to get item: {e}")))?;
            row.as_ref().map(row_to_item).transpose()
        })
    }

    fn upsert_catalog_entry<'a>(
        &'a self,
        sku: Sku,
        name: &'a str,
        kind: &'a str,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO sku (sku_id, name, type) VALUES ($1, $2, $3)
                ON CONFLICT (sku_id) DO UPDATE SET name = EXCLUDED.name, type = EXCLUDED.type
                ",
            )
            .bind(i64::from(sku.0))
            .bind(name)
            .bind(kind)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to save catalog entry: {e}")))?;
            Ok(())
        })
    }

    fn list_by_location<'a>(
        &'a self,
        query: &'a LocationQuery,
    ) -> StoreFuture<'a, (Vec<StockItem>, u64)> {
        Box::pin(async move {
            let db = |e: sqlx::Error| StoreError::Database(format!("Failed to list items: {e}"));
            let offset = i64::try_from(query.offset())
                .map_err(|_| StoreError::InvalidData("page offset out of range".to_string()))?;

            // Page and count share one snapshot.
            let mut tx = self.pool.begin().await.map_err(db)?;
            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
                .execute(&mut *tx)
                .await
                .map_err(db)?;

            let rows = sqlx::query(&format!(
                "{SELECT_ITEM} WHERE i.location = $1 AND i.user_id = $2 ORDER BY i.sku LIMIT $3 OFFSET $4"
            ))
            .bind(&query.location)
            .bind(query.user_id.0)
            .bind(i64::from(query.page_size))
            .bind(offset)
            .fetch_all(&mut *tx)
            .await
            .map_err(db)?;

            let (total,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM items WHERE location = $1 AND user_id = $2")
                    .bind(&query.location)
                    .bind(query.user_id.0)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(db)?;

            tx.commit().await.map_err(db)?;

            let items = rows.iter().map(row_to_item).collect::<Result<Vec<_>, _>>()?;
            let total = u64::try_from(total)
                .map_err(|_| StoreError::InvalidData(format!("negative count {total}")))?;
            Ok((items, total))
        })
    }
}

/// An open claim transaction.
///
/// Dropping it without `commit` rolls back.
pub struct PgStockTransaction {
    tx: Transaction<'static, Postgres>,
}

impl StockTransaction for PgStockTransaction {
    fn catalog_entry_for_update(&mut self, sku: Sku) -> StoreFuture<'_, Option<SkuCatalogEntry>> {
        Box::pin(async move {
            let db = |e: sqlx::Error| StoreError::Database(format!("Failed to read catalog: {e}"));

            // Claims of the same SKU queue here until the holder commits.
            let catalog: Option<(String, String)> =
                sqlx::query_as("SELECT name, type FROM sku WHERE sku_id = $1 FOR UPDATE")
                    .bind(i64::from(sku.0))
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(db)?;
            let Some((name, kind)) = catalog else {
                return Ok(None);
            };

            // Fresh statement: sees an owner committed while we waited on the lock.
            let owner: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM items WHERE sku = $1")
                .bind(i64::from(sku.0))
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db)?;

            Ok(Some(SkuCatalogEntry {
                sku,
                name,
                kind,
                owner: owner.map(|(id,)| UserId(id)),
            }))
        })
    }

    fn upsert_item<'a>(&'a mut self, item: &'a NewStockItem) -> StoreFuture<'a, ClaimOutcome> {
        Box::pin(async move {
            let (updated,): (bool,) = sqlx::query_as(
                r"
                INSERT INTO items (user_id, sku, count, price, location)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (sku) DO UPDATE SET
                    count = items.count + EXCLUDED.count,
                    price = EXCLUDED.price,
                    user_id = EXCLUDED.user_id,
                    location = EXCLUDED.location,
                    updated_at = CURRENT_TIMESTAMP
                RETURNING (xmax::text <> '0') AS updated
                ",
            )
            .bind(item.owner.0)
            .bind(i64::from(item.sku.0))
            .bind(i64::from(item.count))
            .bind(i64::from(item.price))
            .bind(&item.location)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| write_error("Failed to upsert item", &e))?;

            Ok(if updated {
                ClaimOutcome::Changed
            } else {
                ClaimOutcome::Created
            })
        })
    }

    fn commit(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move {
            self.tx
                .commit()
                .await
                .map_err(|e| StoreError::Database(format!("Failed to commit transaction: {e}")))
        })
    }

    fn rollback(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move {
            self.tx
                .rollback()
                .await
                .map_err(|e| StoreError::Database(format!("Failed to roll back transaction: {e}")))
        })
    }
}
