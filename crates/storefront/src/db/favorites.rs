//! Favorites repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use aurelia_core::pricing::unit_price;
use aurelia_core::{FavoriteId, Money, ProductId, Sku, Slug, UserId};

use super::RepositoryError;
use crate::models::{Favorite, ProductSummary};

#[derive(Debug, sqlx::FromRow)]
struct FavoriteRow {
    id: i32,
    created_at: DateTime<Utc>,
    product_id: i32,
    sku: String,
    name: String,
    slug: String,
    image: Option<String>,
    price: Decimal,
    sale_price: Option<Decimal>,
    in_stock: bool,
}

impl TryFrom<FavoriteRow> for Favorite {
    type Error = RepositoryError;

    fn try_from(row: FavoriteRow) -> Result<Self, Self::Error> {
        let price = Money::new(row.price).map_err(|e| RepositoryError::corrupt("price", e))?;
        let sale_price = row
            .sale_price
            .map(Money::new)
            .transpose()
            .map_err(|e| RepositoryError::corrupt("sale price", e))?;

        Ok(Self {
            id: FavoriteId::new(row.id),
            product: ProductSummary {
                id: ProductId::new(row.product_id),
                sku: Sku::parse(&row.sku).map_err(|e| RepositoryError::corrupt("sku", e))?,
                name: row.name,
                slug: Slug::parse(&row.slug).map_err(|e| RepositoryError::corrupt("slug", e))?,
                image: row.image,
                price,
                sale_price,
                unit_price: unit_price(price, sale_price),
                in_stock: row.in_stock,
            },
            created_at: row.created_at,
        })
    }
}

/// Repository for favorite operations.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's favorites, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Favorite>, RepositoryError> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            "SELECT f.id, f.created_at, p.id AS product_id, p.sku, p.name, p.slug,
                    p.images[1] AS image, p.price, p.sale_price, p.in_stock
             FROM shop.favorites f
             JOIN shop.products p ON p.id = f.product_id
             WHERE f.user_id = $1
             ORDER BY f.created_at DESC, f.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Favorite::try_from).collect()
    }

    /// Save a product for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if it is already saved.
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<FavoriteId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.favorites (user_id, product_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or_missing(e, "favorite"))?;

        Ok(FavoriteId::new(id))
    }

    /// Remove a saved product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it was not saved.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.favorites WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
