//! Customer and admin account listings.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use aurelia_core::AdminRole;

use crate::db::{AdminRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::{RequireAdmin, RequireSuperAdmin};
use crate::models::{Admin, Page, Pagination, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Body of `POST /api/admin/admins`.
#[derive(Deserialize)]
pub struct NewAdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: AdminRole,
}

impl std::fmt::Debug for NewAdminRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAdminRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// `GET /api/admin/users`
#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Page<User>>> {
    let page = Pagination::new(query.page, query.per_page).ok_or_else(|| {
        AppError::BadRequest("page must be at least 1 and per_page 1 to 100".to_string())
    })?;
    let users = UserRepository::new(state.pool()).list(page).await?;
    Ok(Json(users))
}

/// `GET /api/admin/admins`
#[instrument(skip(state, _admin))]
pub async fn list_admins(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
) -> Result<Json<Vec<Admin>>> {
    let admins = AdminRepository::new(state.pool()).list().await?;
    Ok(Json(admins))
}

/// `POST /api/admin/admins`
#[instrument(skip(state, admin))]
pub async fn create_admin(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    ApiJson(form): ApiJson<NewAdminRequest>,
) -> Result<(StatusCode, Json<Admin>)> {
    let created = AuthService::new(state.pool())
        .create_admin(&form.username, &form.email, &form.password, form.role)
        .await?;

    tracing::info!(
        by = %admin.username,
        admin_id = %created.id,
        role = %created.role,
        "Admin account created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}
