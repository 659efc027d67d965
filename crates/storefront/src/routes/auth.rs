//! Customer authentication routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{RequireUser, clear_current_user, set_current_user};
use crate::models::User;
use crate::routes::cart::adopt_guest_cart;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration form.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Login form. `login` is a username or an email address.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// Put the user in the session and fold any anonymous cart into theirs.
async fn start_session(state: &AppState, session: &Session, user: &User) -> Result<()> {
    adopt_guest_cart(state, session, user.id).await?;
    set_current_user(session, &user.to_current()).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and log in.
///
/// `POST /api/auth/register`
#[instrument(skip(state, session))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(
            &form.username,
            &form.email,
            &form.password,
            form.full_name.as_deref(),
        )
        .await?;

    start_session(&state, &session, &user).await?;
    tracing::info!(user_id = %user.id, "Customer registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with username or email.
///
/// `POST /api/auth/login`
#[instrument(skip(state, session))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&form.login, &form.password)
        .await
        .inspect_err(|_| tracing::warn!("Failed customer login"))?;

    start_session(&state, &session, &user).await?;
    tracing::info!(user_id = %user.id, "Customer logged in");

    Ok(Json(user))
}

/// Log out.
///
/// `POST /api/auth/logout`
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in customer.
///
/// `GET /api/auth/me`
#[instrument(skip(state, current))]
pub async fn me(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    Ok(Json(user))
}
