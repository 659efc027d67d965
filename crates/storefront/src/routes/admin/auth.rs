//! Admin session routes.

use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::{Admin, CurrentAdmin};
use crate::routes::auth::LoginRequest;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// `POST /api/admin/auth/login`
#[instrument(skip(state, session))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<Json<Admin>> {
    let admin = AuthService::new(state.pool())
        .admin_login(&form.login, &form.password)
        .await
        .inspect_err(|_| tracing::warn!("Failed admin login"))?;

    set_current_admin(&session, &admin.to_current()).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin logged in");

    Ok(Json(admin))
}

/// `POST /api/admin/auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/admin/auth/me`
#[instrument(skip(admin))]
pub async fn me(RequireAdmin(admin): RequireAdmin) -> Json<CurrentAdmin> {
    Json(admin)
}
