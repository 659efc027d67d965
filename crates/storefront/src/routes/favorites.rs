//! Saved-product routes. All require a logged-in customer.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use aurelia_core::{FavoriteId, ProductId};

use crate::db::FavoriteRepository;
use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireUser;
use crate::models::Favorite;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct FavoriteCreated {
    pub id: FavoriteId,
    pub product_id: ProductId,
}

/// `GET /api/favorites`
#[instrument(skip(state, customer))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(customer): RequireUser,
) -> Result<Json<Vec<Favorite>>> {
    let favorites = FavoriteRepository::new(state.pool()).list(customer.id).await?;
    Ok(Json(favorites))
}

/// `POST /api/favorites`
#[instrument(skip(state, customer))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(customer): RequireUser,
    ApiJson(body): ApiJson<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<FavoriteCreated>)> {
    let id = FavoriteRepository::new(state.pool())
        .add(customer.id, body.product_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(FavoriteCreated {
            id,
            product_id: body.product_id,
        }),
    ))
}

/// `DELETE /api/favorites/{product_id}`
#[instrument(skip(state, customer))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(customer): RequireUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    FavoriteRepository::new(state.pool())
        .remove(customer.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
