//! Inventory repository.
//!
//! `products.in_stock` mirrors `inventory.quantity > 0` and is updated in the
//! same statement batch as every quantity change.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use aurelia_core::inventory::{InventoryError, StockLevel};
use aurelia_core::{InventoryId, ProductId, Sku};

use super::RepositoryError;
use crate::models::InventoryRecord;

const INVENTORY_SELECT: &str = "
    SELECT i.id, i.product_id, p.sku, p.name, i.quantity, i.min_threshold, i.updated_at
    FROM shop.inventory i
    JOIN shop.products p ON p.id = i.product_id";

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: i32,
    product_id: i32,
    sku: String,
    name: String,
    quantity: i32,
    min_threshold: i32,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InventoryRow> for InventoryRecord {
    type Error = RepositoryError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        let level = StockLevel::new(row.quantity, row.min_threshold)
            .map_err(|e| RepositoryError::corrupt("stock level", e))?;
        Ok(Self {
            id: InventoryId::new(row.id),
            product_id: ProductId::new(row.product_id),
            sku: Sku::parse(&row.sku).map_err(|e| RepositoryError::corrupt("sku", e))?,
            name: row.name,
            quantity: level.quantity,
            min_threshold: level.min_threshold,
            low_stock: level.is_low_stock(),
            out_of_stock: level.is_out_of_stock(),
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LevelRow {
    quantity: i32,
    min_threshold: i32,
}

/// Errors from stock adjustments.
#[derive(Debug, thiserror::Error)]
pub enum AdjustError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Stock(#[from] InventoryError),
}

impl From<sqlx::Error> for AdjustError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Repository for inventory operations.
pub struct InventoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List stock records, optionally only those at or below threshold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, low_stock_only: bool) -> Result<Vec<InventoryRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "{INVENTORY_SELECT}
             WHERE NOT $1 OR i.quantity <= i.min_threshold
             ORDER BY i.quantity, p.name"
        ))
        .bind(low_stock_only)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(InventoryRecord::try_from).collect()
    }

    /// Stock record for a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            "{INVENTORY_SELECT} WHERE i.product_id = $1"
        ))
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(InventoryRecord::try_from).transpose()
    }

    /// Overwrite a product's stock level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product has no inventory row.
    pub async fn set(
        &self,
        product_id: ProductId,
        level: StockLevel,
    ) -> Result<InventoryRecord, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE shop.inventory SET quantity = $2, min_threshold = $3, updated_at = NOW()
             WHERE product_id = $1",
        )
        .bind(product_id)
        .bind(level.quantity)
        .bind(level.min_threshold)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        sync_in_stock(&mut tx, product_id).await?;
        tx.commit().await?;

        self.get(product_id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Apply a signed adjustment.
    ///
    /// # Errors
    ///
    /// Returns `AdjustError::Stock` if the result would be negative.
    /// Returns `RepositoryError::NotFound` if the product has no inventory row.
    pub async fn adjust(
        &self,
        product_id: ProductId,
        delta: i32,
    ) -> Result<InventoryRecord, AdjustError> {
        let mut tx = self.pool.begin().await?;

        let level = lock_level(&mut tx, product_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let adjusted = level.adjust(delta)?;
        write_quantity(&mut tx, product_id, adjusted.quantity).await?;

        tx.commit().await?;

        Ok(self.get(product_id).await?.ok_or(RepositoryError::NotFound)?)
    }
}

/// Lock a product's stock row for the rest of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_level(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<Option<StockLevel>, RepositoryError> {
    let row = sqlx::query_as::<_, LevelRow>(
        "SELECT quantity, min_threshold FROM shop.inventory WHERE product_id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|r| {
        StockLevel::new(r.quantity, r.min_threshold)
            .map_err(|e| RepositoryError::corrupt("stock level", e))
    })
    .transpose()
}

/// Store a new quantity and refresh the product's `in_stock` flag.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn write_quantity(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.inventory SET quantity = $2, updated_at = NOW() WHERE product_id = $1",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    sync_in_stock(conn, product_id).await
}

async fn sync_in_stock(conn: &mut PgConnection, product_id: ProductId) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE shop.products p SET in_stock = i.quantity > 0, updated_at = NOW()
         FROM shop.inventory i
         WHERE i.product_id = p.id AND p.id = $1",
    )
    .bind(product_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
