//! Inventory view for the back office.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aurelia_core::inventory::StockLevel;
use aurelia_core::{InventoryId, ProductId, Sku};

/// Stock record joined with its product.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryRecord {
    pub id: InventoryId,
    pub product_id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub quantity: i32,
    pub min_threshold: i32,
    pub low_stock: bool,
    pub out_of_stock: bool,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    #[must_use]
    pub const fn level(&self) -> StockLevel {
        StockLevel {
            quantity: self.quantity,
            min_threshold: self.min_threshold,
        }
    }
}
