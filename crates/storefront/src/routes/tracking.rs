//! Public shipment tracking.

use axum::{Json, extract::State};
use tracing::instrument;

use aurelia_core::tracking::is_valid_tracking_number;

use crate::db::ShippingRepository;
use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::models::Shipment;
use crate::state::AppState;

/// `GET /api/tracking/{tracking_number}`
///
/// Lookups are case-insensitive.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(tracking_number): ApiPath<String>,
) -> Result<Json<Shipment>> {
    let tracking_number = tracking_number.trim().to_ascii_uppercase();
    if !is_valid_tracking_number(&tracking_number) {
        return Err(AppError::BadRequest(format!(
            "'{tracking_number}' is not a valid tracking number"
        )));
    }

    let shipment = ShippingRepository::new(state.pool())
        .get_by_tracking_number(&tracking_number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No shipment with tracking number {tracking_number}")))?;

    Ok(Json(shipment))
}
