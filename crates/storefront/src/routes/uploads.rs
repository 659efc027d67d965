//! Image uploads to object storage.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::session::keys;
use crate::models::{CurrentAdmin, CurrentUser};
use crate::state::AppState;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Uploads are open to any logged-in customer or admin.
async fn require_uploader(session: &Session) -> Result<()> {
    let user = session.get::<CurrentUser>(keys::CURRENT_USER).await?;
    let admin = session.get::<CurrentAdmin>(keys::CURRENT_ADMIN).await?;
    if user.is_none() && admin.is_none() {
        return Err(AppError::Unauthorized("Authentication required".to_string()));
    }
    Ok(())
}

/// Store an image and return its public URL.
///
/// `POST /api/uploads/images` (multipart, field `file`)
#[instrument(skip(state, session, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    session: Session,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    require_uploader(&session).await?;
    let storage = state.storage()?;
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_owned)
            .ok_or_else(|| AppError::BadRequest("File content type is required".to_string()))?;
        let bytes = field.bytes().await?;

        let url = storage.upload_image(&content_type, bytes).await?;
        return Ok(Json(UploadResponse { url: url.into() }));
    }

    Err(AppError::BadRequest(format!(
        "Multipart field '{FILE_FIELD}' is required"
    )))
}
