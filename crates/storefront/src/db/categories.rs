//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use aurelia_core::{CategoryId, Slug};

use super::RepositoryError;
use crate::models::Category;
use crate::models::catalog::{CategoryUpdate, NewCategory};

const CATEGORY_SELECT: &str = "
    SELECT c.id, c.name, c.slug, c.description, c.image_url, c.created_at,
           (SELECT COUNT(*) FROM shop.products p WHERE p.category_id = c.id) AS product_count
    FROM shop.categories c";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    product_count: i64,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: Slug::parse(&row.slug).map_err(|e| RepositoryError::corrupt("slug", e))?,
            description: row.description,
            image_url: row.image_url,
            product_count: row.product_count,
            created_at: row.created_at,
        })
    }
}

/// Repository for category operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} ORDER BY c.name"))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Category::try_from).collect()
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(Category::try_from).transpose()
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Category::try_from).transpose()
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, new: &NewCategory, slug: &Slug) -> Result<Category, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.categories (name, slug, description, image_url)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(new.name.trim())
        .bind(slug)
        .bind(new.description.as_deref())
        .bind(new.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "category slug"))?;

        self.get_by_id(CategoryId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.categories
             SET name = COALESCE($2, name),
                 slug = COALESCE($3, slug),
                 description = COALESCE($4, description),
                 image_url = COALESCE($5, image_url)
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.slug.as_ref())
        .bind(update.description.as_deref())
        .bind(update.image_url.as_deref())
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "category slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category. Its products stay, with no category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
