//! Stock management.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use aurelia_core::ProductId;
use aurelia_core::inventory::StockLevel;

use crate::db::InventoryRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireAdminWrite};
use crate::models::InventoryRecord;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    #[serde(default)]
    pub low_stock: bool,
}

/// Body of `PUT /api/admin/inventory/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub quantity: i32,
    pub min_threshold: i32,
}

/// Body of `POST /api/admin/inventory/{product_id}/adjust`.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i32,
    pub reason: Option<String>,
}

fn record_not_found(product_id: ProductId) -> AppError {
    AppError::NotFound(format!("No inventory for product {product_id}"))
}

/// `GET /api/admin/inventory?low_stock=true`
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<InventoryQuery>,
) -> Result<Json<Vec<InventoryRecord>>> {
    let records = InventoryRepository::new(state.pool())
        .list(query.low_stock)
        .await?;
    Ok(Json(records))
}

/// `GET /api/admin/inventory/{product_id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<InventoryRecord>> {
    let record = InventoryRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| record_not_found(product_id))?;
    Ok(Json(record))
}

/// Overwrite the stock level.
///
/// `PUT /api/admin/inventory/{product_id}`
#[instrument(skip(state, admin))]
pub async fn set(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<SetStockRequest>,
) -> Result<Json<InventoryRecord>> {
    let level = StockLevel::new(body.quantity, body.min_threshold)?;
    let record = InventoryRepository::new(state.pool())
        .set(product_id, level)
        .await?;
    state.catalog().invalidate_all().await;

    tracing::info!(
        admin = %admin.username,
        product_id = %product_id,
        quantity = record.quantity,
        "Stock level set"
    );
    Ok(Json(record))
}

/// Apply a signed adjustment. Fails rather than going below zero.
///
/// `POST /api/admin/inventory/{product_id}/adjust`
#[instrument(skip(state, admin))]
pub async fn adjust(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<AdjustStockRequest>,
) -> Result<Json<InventoryRecord>> {
    let record = InventoryRepository::new(state.pool())
        .adjust(product_id, body.delta)
        .await?;
    state.catalog().invalidate_all().await;

    tracing::info!(
        admin = %admin.username,
        product_id = %product_id,
        delta = body.delta,
        reason = body.reason.as_deref().unwrap_or(""),
        quantity = record.quantity,
        "Stock adjusted"
    );
    Ok(Json(record))
}
