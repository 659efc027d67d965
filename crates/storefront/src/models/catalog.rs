//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use aurelia_core::pricing::{discount_percent, unit_price};
use aurelia_core::{CategoryId, Money, ProductId, Sku, Slug};

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A product with its computed selling price.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub category_slug: Option<Slug>,
    pub sku: Sku,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub material: Option<String>,
    pub price: Money,
    pub sale_price: Option<Money>,
    /// Price actually charged per unit.
    pub unit_price: Money,
    pub discount_percent: Option<u8>,
    pub images: Vec<String>,
    pub in_stock: bool,
    pub is_featured: bool,
    pub rating: Decimal,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Fill in `unit_price` and `discount_percent` from the list and sale prices.
    pub fn apply_pricing(&mut self) {
        self.unit_price = unit_price(self.price, self.sale_price);
        self.discount_percent = discount_percent(self.price, self.sale_price);
    }

    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            sku: self.sku.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            image: self.primary_image().map(str::to_owned),
            price: self.price,
            sale_price: self.sale_price,
            unit_price: self.unit_price,
            in_stock: self.in_stock,
        }
    }
}

/// Compact product view used in carts and favorites.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub slug: Slug,
    pub image: Option<String>,
    pub price: Money,
    pub sale_price: Option<Money>,
    pub unit_price: Money,
    pub in_stock: bool,
}

/// Product listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
}

impl ProductSort {
    /// SQL `ORDER BY` clause. Ties break on id so pages are stable.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::PriceAsc => "CASE WHEN p.sale_price > 0 AND p.sale_price < p.price THEN p.sale_price ELSE p.price END ASC, p.id",
            Self::PriceDesc => "CASE WHEN p.sale_price > 0 AND p.sale_price < p.price THEN p.sale_price ELSE p.price END DESC, p.id",
            Self::Rating => "p.rating DESC, p.review_count DESC, p.id",
            Self::Name => "p.name ASC, p.id",
        }
    }
}

/// Product listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Case-insensitive match on name, description or sku.
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub on_sale: Option<bool>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub sort: ProductSort,
}

/// Fields for a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub category_id: Option<CategoryId>,
    pub sku: Sku,
    pub name: String,
    /// Derived from `name` when absent.
    pub slug: Option<Slug>,
    #[serde(default)]
    pub description: String,
    pub material: Option<String>,
    pub price: Money,
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    /// Opening stock level.
    #[serde(default)]
    pub initial_quantity: i32,
    pub min_threshold: Option<i32>,
}

/// Partial product update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    /// `Some(None)` removes the product from its category.
    #[serde(default, with = "double_option")]
    pub category_id: Option<Option<CategoryId>>,
    pub name: Option<String>,
    pub slug: Option<Slug>,
    /// An empty string clears the description.
    pub description: Option<String>,
    /// `Some(None)` clears the material.
    #[serde(default, with = "double_option")]
    pub material: Option<Option<String>>,
    pub price: Option<Money>,
    /// `Some(None)` clears the sale price.
    #[serde(default, with = "double_option")]
    pub sale_price: Option<Option<Money>>,
    pub images: Option<Vec<String>>,
    pub is_featured: Option<bool>,
}

/// Fields for a new category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: Option<Slug>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Partial category update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<Slug>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Distinguish a missing field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parses_snake_case() {
        let sort: ProductSort = serde_json::from_str("\"price_desc\"").unwrap();
        assert_eq!(sort, ProductSort::PriceDesc);
        assert!(serde_json::from_str::<ProductSort>("\"cheapest\"").is_err());
    }

    #[test]
    fn test_update_distinguishes_null_sale_price() {
        let cleared: ProductUpdate = serde_json::from_str(r#"{"sale_price": null}"#).unwrap();
        assert_eq!(cleared.sale_price, Some(None));

        let untouched: ProductUpdate = serde_json::from_str(r#"{"name": "Halo Ring"}"#).unwrap();
        assert_eq!(untouched.sale_price, None);

        let set: ProductUpdate = serde_json::from_str(r#"{"sale_price": "89.00"}"#).unwrap();
        assert_eq!(set.sale_price, Some(Some(Money::from_cents(8_900))));
    }

    #[test]
    fn test_update_distinguishes_null_material_and_category() {
        let cleared: ProductUpdate =
            serde_json::from_str(r#"{"material": null, "category_id": null}"#).unwrap();
        assert_eq!(cleared.material, Some(None));
        assert_eq!(cleared.category_id, Some(None));

        let untouched: ProductUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.material, None);
        assert_eq!(untouched.category_id, None);

        let set: ProductUpdate =
            serde_json::from_str(r#"{"material": "Gold", "category_id": 3}"#).unwrap();
        assert_eq!(set.material, Some(Some("Gold".to_string())));
        assert_eq!(set.category_id, Some(Some(CategoryId::new(3))));
    }

    #[test]
    fn test_update_rejects_price_over_max() {
        let body = r#"{"price": "1000000000.00"}"#;
        assert!(serde_json::from_str::<ProductUpdate>(body).is_err());
    }

    #[test]
    fn test_new_product_rejects_bad_sku() {
        let body = r#"{"sku": "x", "name": "Ring", "price": "10.00"}"#;
        assert!(serde_json::from_str::<NewProduct>(body).is_err());
    }
}
