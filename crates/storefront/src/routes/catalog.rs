//! Public catalog routes: categories and products.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use aurelia_core::Money;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiPath, ApiQuery};
use crate::models::{Category, Page, Pagination, Product, ProductFilter, ProductSort};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub on_sale: Option<bool>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductQuery {
    pub(crate) fn into_parts(self) -> Result<(ProductFilter, Pagination)> {
        let page = Pagination::new(self.page, self.per_page).ok_or_else(|| {
            AppError::BadRequest("page must be at least 1 and per_page 1 to 100".to_string())
        })?;
        let filter = ProductFilter {
            category: self.category.filter(|c| !c.trim().is_empty()),
            search: self.search.filter(|s| !s.trim().is_empty()),
            min_price: self.min_price,
            max_price: self.max_price,
            on_sale: self.on_sale,
            featured: self.featured,
            in_stock: self.in_stock,
            sort: self.sort,
        };
        Ok((filter, page))
    }
}

/// All categories with product counts.
///
/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = state.catalog().categories(state.pool()).await?;
    Ok(Json(categories))
}

/// `GET /api/categories/{slug}`
#[instrument(skip(state))]
pub async fn show_category(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Category>> {
    let category = state
        .catalog()
        .categories(state.pool())
        .await?
        .into_iter()
        .find(|c| c.slug.as_str() == slug)
        .ok_or_else(|| AppError::NotFound(format!("Category '{slug}' not found")))?;
    Ok(Json(category))
}

/// Filtered, paginated product listing.
///
/// `GET /api/products`
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Page<Product>>> {
    let (filter, page) = query.into_parts()?;
    let products = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(products))
}

/// `GET /api/products/{slug}`
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Product>> {
    let product = state
        .catalog()
        .product(state.pool(), &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product '{slug}' not found")))?;
    Ok(Json(product))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let (filter, page) = ProductQuery::default().into_parts().unwrap();
        assert_eq!(filter, ProductFilter::default());
        assert_eq!(page, Pagination::default());
    }

    #[test]
    fn test_query_rejects_large_page_size() {
        let query = ProductQuery {
            per_page: Some(500),
            ..ProductQuery::default()
        };
        assert!(matches!(query.into_parts(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = ProductQuery {
            search: Some("   ".to_string()),
            category: Some("rings".to_string()),
            ..ProductQuery::default()
        };
        let (filter, _) = query.into_parts().unwrap();
        assert_eq!(filter.search, None);
        assert_eq!(filter.category.as_deref(), Some("rings"));
    }
}
