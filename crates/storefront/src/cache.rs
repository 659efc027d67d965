//! Catalog cache.
//!
//! Category listings and product detail lookups are cached with `moka`.
//! Admin catalog and inventory mutations call [`CatalogCache::invalidate_all`].

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::models::{Category, Product};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Product(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Vec<Category>),
    Product(Box<Product>),
}

/// Read-through cache in front of the catalog repositories.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// All categories with product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn categories(&self, pool: &PgPool) -> Result<Vec<Category>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(&CacheKey::Categories).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = CategoryRepository::new(pool).list().await?;
        self.cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Product detail by slug. Misses are not cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn product(&self, pool: &PgPool, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let key = CacheKey::Product(slug.to_string());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!(slug, "Cache hit for product");
            return Ok(Some(*product));
        }

        let product = ProductRepository::new(pool).get_by_slug(slug).await?;
        if let Some(product) = &product {
            self.cache
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        debug!("Catalog cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalidate_all_clears_entries() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(Vec::new()))
            .await;
        assert!(cache.cache.get(&CacheKey::Categories).await.is_some());

        cache.invalidate_all().await;
        assert!(cache.cache.get(&CacheKey::Categories).await.is_none());
    }
}
