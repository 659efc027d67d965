//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::CatalogCache;
use crate::config::StorefrontConfig;
use crate::services::storage::{StorageClient, StorageError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogCache,
    storage: Option<StorageClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the object storage client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StorageError> {
        let catalog = CatalogCache::new(config.catalog_cache_ttl);
        let storage = config.storage.clone().map(StorageClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                storage,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the catalog cache.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }

    /// Object storage client.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotConfigured` when uploads are disabled.
    pub fn storage(&self) -> Result<&StorageClient, StorageError> {
        self.inner
            .storage
            .as_ref()
            .ok_or(StorageError::NotConfigured)
    }
}
