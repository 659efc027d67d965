//! Product repository.
//!
//! Listing filters are bound as nullable parameters so the statement text
//! only varies by sort order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use aurelia_core::inventory::DEFAULT_MIN_THRESHOLD;
use aurelia_core::{CategoryId, Money, ProductId, Sku, Slug};

use super::RepositoryError;
use crate::models::catalog::{NewProduct, ProductUpdate};
use crate::models::{Page, Pagination, Product, ProductFilter};

const PRODUCT_SELECT: &str = "
    SELECT p.id, p.category_id, c.slug AS category_slug, p.sku, p.name, p.slug,
           p.description, p.material, p.price, p.sale_price, p.images, p.in_stock,
           p.is_featured, p.rating, p.review_count, p.created_at, p.updated_at
    FROM shop.products p
    LEFT JOIN shop.categories c ON c.id = p.category_id";

const EFFECTIVE_PRICE: &str =
    "(CASE WHEN p.sale_price > 0 AND p.sale_price < p.price THEN p.sale_price ELSE p.price END)";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    category_id: Option<i32>,
    category_slug: Option<String>,
    sku: String,
    name: String,
    slug: String,
    description: String,
    material: Option<String>,
    price: Decimal,
    sale_price: Option<Decimal>,
    images: Vec<String>,
    in_stock: bool,
    is_featured: bool,
    rating: Decimal,
    review_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Money::new(row.price).map_err(|e| RepositoryError::corrupt("price", e))?;
        let sale_price = row
            .sale_price
            .map(Money::new)
            .transpose()
            .map_err(|e| RepositoryError::corrupt("sale price", e))?;
        let category_slug = row
            .category_slug
            .as_deref()
            .map(Slug::parse)
            .transpose()
            .map_err(|e| RepositoryError::corrupt("category slug", e))?;

        let mut product = Self {
            id: ProductId::new(row.id),
            category_id: row.category_id.map(CategoryId::new),
            category_slug,
            sku: Sku::parse(&row.sku).map_err(|e| RepositoryError::corrupt("sku", e))?,
            name: row.name,
            slug: Slug::parse(&row.slug).map_err(|e| RepositoryError::corrupt("slug", e))?,
            description: row.description,
            material: row.material,
            price,
            sale_price,
            unit_price: price,
            discount_percent: None,
            images: row.images,
            in_stock: row.in_stock,
            is_featured: row.is_featured,
            rating: row.rating,
            review_count: row.review_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        product.apply_pricing();
        Ok(product)
    }
}

/// Turn free text into an `ILIKE` pattern, escaping wildcards.
fn like_pattern(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

fn filter_clause() -> String {
    format!(
        "WHERE ($1::text IS NULL OR c.slug = $1)
           AND ($2::text IS NULL OR p.name ILIKE $2 OR p.description ILIKE $2 OR p.sku ILIKE $2)
           AND ($3::numeric IS NULL OR {EFFECTIVE_PRICE} >= $3)
           AND ($4::numeric IS NULL OR {EFFECTIVE_PRICE} <= $4)
           AND ($5::bool IS NULL OR (p.sale_price > 0 AND p.sale_price < p.price) = $5)
           AND ($6::bool IS NULL OR p.is_featured = $6)
           AND ($7::bool IS NULL OR p.in_stock = $7)"
    )
}

/// Split a nullable patch field into a clear flag and a replacement value.
fn split_nullable<T>(field: Option<&Option<T>>) -> (bool, Option<&T>) {
    match field {
        Some(None) => (true, None),
        Some(Some(value)) => (false, Some(value)),
        None => (false, None),
    }
}

/// Repository for product operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Page<Product>, RepositoryError> {
        let search = filter.search.as_deref().and_then(like_pattern);
        let where_clause = filter_clause();

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM shop.products p
             LEFT JOIN shop.categories c ON c.id = p.category_id
             {where_clause}"
        ))
        .bind(filter.category.as_deref())
        .bind(search.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.on_sale)
        .bind(filter.featured)
        .bind(filter.in_stock)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} {where_clause} ORDER BY {} LIMIT $8 OFFSET $9",
            filter.sort.order_by()
        ))
        .bind(filter.category.as_deref())
        .bind(search.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.on_sale)
        .bind(filter.featured)
        .bind(filter.in_stock)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(Product::try_from)
                .collect::<Result<_, _>>()?,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Create a product together with its inventory row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the sku or slug is taken.
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn create(&self, new: &NewProduct, slug: &Slug) -> Result<Product, RepositoryError> {
        let quantity = new.initial_quantity;
        let min_threshold = new.min_threshold.unwrap_or(DEFAULT_MIN_THRESHOLD);

        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.products
                 (category_id, sku, name, slug, description, material, price, sale_price,
                  images, in_stock, is_featured)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING id",
        )
        .bind(new.category_id)
        .bind(&new.sku)
        .bind(new.name.trim())
        .bind(slug)
        .bind(&new.description)
        .bind(new.material.as_deref())
        .bind(new.price)
        .bind(new.sale_price)
        .bind(&new.images)
        .bind(quantity > 0)
        .bind(new.is_featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_or_missing(e, "product sku or slug"))?;

        sqlx::query(
            "INSERT INTO shop.inventory (product_id, quantity, min_threshold)
             VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(quantity)
        .bind(min_threshold)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_by_id(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let (clear_category, category_id) = split_nullable(update.category_id.as_ref());
        let (clear_material, material) = split_nullable(update.material.as_ref());
        let (clear_sale, sale_price) = split_nullable(update.sale_price.as_ref());

        let result = sqlx::query(
            "UPDATE shop.products
             SET category_id = CASE WHEN $2 THEN NULL ELSE COALESCE($3, category_id) END,
                 name = COALESCE($4, name),
                 slug = COALESCE($5, slug),
                 description = COALESCE($6, description),
                 material = CASE WHEN $7 THEN NULL ELSE COALESCE($8, material) END,
                 price = COALESCE($9, price),
                 sale_price = CASE WHEN $10 THEN NULL ELSE COALESCE($11, sale_price) END,
                 images = COALESCE($12, images),
                 is_featured = COALESCE($13, is_featured),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(clear_category)
        .bind(category_id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.slug.as_ref())
        .bind(update.description.as_deref())
        .bind(clear_material)
        .bind(material.map(String::as_str))
        .bind(update.price)
        .bind(clear_sale)
        .bind(sale_price)
        .bind(update.images.as_ref())
        .bind(update.is_featured)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or_missing(e, "product slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Cart lines, favorites and inventory go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("  gold  ").as_deref(), Some("%gold%"));
        assert_eq!(like_pattern("50%_off").as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(like_pattern("   "), None);
    }

    #[test]
    fn test_split_nullable() {
        let material = Some("Gold".to_string());
        assert_eq!(split_nullable(Some(&None::<String>)), (true, None));
        assert_eq!(split_nullable(Some(&material)), (false, material.as_ref()));
        assert_eq!(split_nullable::<String>(None), (false, None));
    }
}
