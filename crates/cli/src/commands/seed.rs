//! Catalog seeding from YAML.
//!
//! Categories are matched by slug and created when missing. Products are
//! created with their opening stock; a product whose sku (or slug) already
//! exists is skipped, so the command can be re-run safely.
//!
//! Prices are written as strings (`"129.00"`) so they parse exactly.

use std::path::Path;

use aurelia_core::{CategoryId, Money, Sku, Slug};
use aurelia_storefront::db::{CategoryRepository, ProductRepository, RepositoryError};
use aurelia_storefront::models::catalog::{NewCategory, NewProduct};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};

/// Top level of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: Option<Slug>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub sku: Sku,
    pub name: String,
    pub slug: Option<Slug>,
    /// Category slug.
    pub category: Option<Slug>,
    #[serde(default)]
    pub description: String,
    pub material: Option<String>,
    pub price: Money,
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub quantity: i32,
    pub min_threshold: Option<i32>,
}

/// Counts reported at the end of a seed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

impl SeedProduct {
    fn to_new_product(&self, category_id: Option<CategoryId>) -> NewProduct {
        NewProduct {
            category_id,
            sku: self.sku.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            material: self.material.clone(),
            price: self.price,
            sale_price: self.sale_price,
            images: self.images.clone(),
            is_featured: self.featured,
            initial_quantity: self.quantity,
            min_threshold: self.min_threshold,
        }
    }
}

/// Parse a catalog file body.
///
/// # Errors
///
/// Returns the YAML error for malformed input or invalid field values.
pub fn parse(content: &str) -> Result<CatalogFile, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a database
/// operation fails for a reason other than an existing product.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let file = parse(&content)?;
    info!(
        categories = file.categories.len(),
        products = file.products.len(),
        "Parsed catalog"
    );

    let pool = super::connect().await?;
    let summary = seed(&pool, &file).await?;

    info!("Seeding complete!");
    info!("  Categories created: {}", summary.categories_created);
    info!("  Products created: {}", summary.products_created);
    info!("  Products skipped (already exist): {}", summary.products_skipped);
    Ok(())
}

async fn seed(pool: &PgPool, file: &CatalogFile) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let categories = CategoryRepository::new(pool);
    let products = ProductRepository::new(pool);
    let mut summary = SeedSummary::default();

    for category in &file.categories {
        let slug = match &category.slug {
            Some(slug) => slug.clone(),
            None => Slug::from_name(&category.name)?,
        };
        if categories.get_by_slug(slug.as_str()).await?.is_some() {
            continue;
        }
        let new = NewCategory {
            name: category.name.clone(),
            slug: Some(slug.clone()),
            description: category.description.clone(),
            image_url: category.image_url.clone(),
        };
        categories.create(&new, &slug).await?;
        summary.categories_created += 1;
    }

    for product in &file.products {
        let category_id = match &product.category {
            Some(slug) => match categories.get_by_slug(slug.as_str()).await? {
                Some(category) => Some(category.id),
                None => {
                    warn!(sku = %product.sku, category = %slug, "Unknown category, seeding without one");
                    None
                }
            },
            None => None,
        };

        let new = product.to_new_product(category_id);
        let slug = match &new.slug {
            Some(slug) => slug.clone(),
            None => Slug::from_name(&new.name)?,
        };

        match products.create(&new, &slug).await {
            Ok(created) => {
                info!(sku = %created.sku, "Product created");
                summary.products_created += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                summary.products_skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_catalog() {
        let file = parse(include_str!("../../seed/catalog.yaml")).unwrap();
        assert!(!file.categories.is_empty());
        assert!(!file.products.is_empty());
        assert!(file.products.iter().all(|p| !p.price.is_zero()));
    }

    #[test]
    fn test_defaults_applied() {
        let file = parse(
            r#"
products:
  - sku: pnd-001
    name: Pearl Pendant
    price: "89.50"
"#,
        )
        .unwrap();
        assert!(file.categories.is_empty());
        let product = &file.products[0];
        assert_eq!(product.sku.as_str(), "PND-001");
        assert_eq!(product.quantity, 0);
        assert!(!product.featured);

        let new = product.to_new_product(None);
        assert_eq!(new.price, Money::from_cents(8_950));
        assert_eq!(new.initial_quantity, 0);
    }

    #[test]
    fn test_invalid_sku_rejected() {
        let result = parse(
            r#"
products:
  - sku: "a b"
    name: Broken
    price: "10.00"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_price_over_max_rejected() {
        let result = parse(
            r#"
products:
  - sku: "AU-BIG-1"
    name: Crown
    price: "1000000000.00"
"#,
        );
        assert!(result.is_err());
    }
}
