//! Saved products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aurelia_core::FavoriteId;

use super::catalog::ProductSummary;

/// A product a customer saved.
#[derive(Debug, Clone, Serialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub product: ProductSummary,
    pub created_at: DateTime<Utc>,
}
