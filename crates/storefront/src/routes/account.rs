//! Account route handlers.
//!
//! These routes require a logged-in customer.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aurelia_core::Email;

use crate::db::UserRepository;
use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::RequireUser;
use crate::models::User;
use crate::models::session::keys;
use crate::state::AppState;

/// Profile changes. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// Update the customer's profile.
///
/// `PATCH /api/account`
#[instrument(skip(state, session, current))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireUser(current): RequireUser,
    ApiJson(form): ApiJson<ProfileUpdate>,
) -> Result<Json<User>> {
    let email = form.email.as_deref().map(Email::parse).transpose()?;
    let full_name = form.full_name.as_deref().map(str::trim);

    let user = UserRepository::new(state.pool())
        .update_profile(current.id, full_name, email.as_ref())
        .await?;

    // Keep the session identity in step with the new email.
    session.insert(keys::CURRENT_USER, user.to_current()).await?;

    Ok(Json(user))
}
