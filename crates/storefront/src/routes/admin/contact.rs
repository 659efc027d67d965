//! Contact inbox.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use aurelia_core::ContactMessageId;

use crate::db::ContactRepository;
use crate::error::Result;
use crate::extract::ApiPath;
use crate::middleware::{RequireAdmin, RequireAdminWrite};
use crate::models::ContactMessage;
use crate::state::AppState;

/// `GET /api/admin/contact`
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<ContactMessage>>> {
    let messages = ContactRepository::new(state.pool()).list().await?;
    Ok(Json(messages))
}

/// `DELETE /api/admin/contact/{id}`
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(id): ApiPath<ContactMessageId>,
) -> Result<StatusCode> {
    ContactRepository::new(state.pool()).delete(id).await?;
    tracing::info!(admin = %admin.username, message_id = %id, "Contact message deleted");
    Ok(StatusCode::NO_CONTENT)
}
