//! Product and category management.
//!
//! Every successful write invalidates the catalog cache.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use aurelia_core::inventory::{DEFAULT_MIN_THRESHOLD, StockLevel};
use aurelia_core::{CategoryId, ProductId, Slug};

use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireAdminWrite};
use crate::models::catalog::{CategoryUpdate, NewCategory, NewProduct, ProductUpdate};
use crate::models::{Category, Page, Product};
use crate::routes::catalog::ProductQuery;
use crate::state::AppState;

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    Ok(())
}

/// Use the given slug, or derive one from the name.
fn slug_for(slug: Option<&Slug>, name: &str) -> Result<Slug> {
    match slug {
        Some(slug) => Ok(slug.clone()),
        None => Ok(Slug::from_name(name)?),
    }
}

fn product_not_found(id: ProductId) -> AppError {
    AppError::NotFound(format!("Product {id} not found"))
}

/// `GET /api/admin/products`
#[instrument(skip(state, _admin))]
pub async fn list_products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Page<Product>>> {
    let (filter, page) = query.into_parts()?;
    let products = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(products))
}

/// `GET /api/admin/products/{id}`
#[instrument(skip(state, _admin))]
pub async fn show_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| product_not_found(id))?;
    Ok(Json(product))
}

/// Create a product and its stock row.
///
/// `POST /api/admin/products`
#[instrument(skip(state, admin, new), fields(sku = %new.sku))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiJson(new): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    require_name(&new.name)?;
    // Rejects negative opening stock.
    StockLevel::new(
        new.initial_quantity,
        new.min_threshold.unwrap_or(DEFAULT_MIN_THRESHOLD),
    )?;
    let slug = slug_for(new.slug.as_ref(), &new.name)?;

    let product = ProductRepository::new(state.pool())
        .create(&new, &slug)
        .await?;
    state.catalog().invalidate_all().await;

    tracing::info!(admin = %admin.username, product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PATCH /api/admin/products/{id}`
#[instrument(skip(state, admin, update))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Product>> {
    if let Some(name) = &update.name {
        require_name(name)?;
    }
    let product = ProductRepository::new(state.pool())
        .update(id, &update)
        .await?;
    state.catalog().invalidate_all().await;

    tracing::info!(admin = %admin.username, product_id = %id, "Product updated");
    Ok(Json(product))
}

/// `DELETE /api/admin/products/{id}`
#[instrument(skip(state, admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    state.catalog().invalidate_all().await;

    tracing::info!(admin = %admin.username, product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/admin/categories`
#[instrument(skip(state, _admin))]
pub async fn list_categories(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Category>>> {
    // Uncached so admins always see live product counts.
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// `POST /api/admin/categories`
#[instrument(skip(state, admin))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiJson(new): ApiJson<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    require_name(&new.name)?;
    let slug = slug_for(new.slug.as_ref(), &new.name)?;

    let category = CategoryRepository::new(state.pool())
        .create(&new, &slug)
        .await?;
    state.catalog().invalidate_all().await;

    tracing::info!(admin = %admin.username, category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PATCH /api/admin/categories/{id}`
#[instrument(skip(state, admin))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(update): ApiJson<CategoryUpdate>,
) -> Result<Json<Category>> {
    if let Some(name) = &update.name {
        require_name(name)?;
    }
    let category = CategoryRepository::new(state.pool())
        .update(id, &update)
        .await?;
    state.catalog().invalidate_all().await;

    tracing::info!(admin = %admin.username, category_id = %id, "Category updated");
    Ok(Json(category))
}

/// Delete a category. Its products are kept without a category.
///
/// `DELETE /api/admin/categories/{id}`
#[instrument(skip(state, admin))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    state.catalog().invalidate_all().await;

    tracing::info!(admin = %admin.username, category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_derived_from_name() {
        let slug = slug_for(None, "Rose Gold Rings").unwrap();
        assert_eq!(slug.as_str(), "rose-gold-rings");
    }

    #[test]
    fn test_explicit_slug_kept() {
        let explicit = Slug::parse("bands").unwrap();
        assert_eq!(slug_for(Some(&explicit), "Wedding Bands").unwrap(), explicit);
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(require_name("  ").is_err());
        assert!(require_name("Pearls").is_ok());
    }
}
