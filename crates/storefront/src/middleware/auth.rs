//! Authentication extractors.
//!
//! Customer and admin identities live under separate session keys, so one
//! browser can hold both. Rejections are JSON `AppError` responses.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session::keys;
use crate::models::{CurrentAdmin, CurrentUser};

/// Extractor that requires a logged-in customer (401 otherwise).
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

/// Extractor that optionally gets the current customer.
pub struct OptionalUser(pub Option<CurrentUser>);

/// Extractor that requires a logged-in admin of any role (401 otherwise).
pub struct RequireAdmin(pub CurrentAdmin);

/// Extractor that requires an admin allowed to write (403 for viewers).
pub struct RequireAdminWrite(pub CurrentAdmin);

/// Extractor that requires a super admin (403 for other roles).
pub struct RequireSuperAdmin(pub CurrentAdmin);

fn session(parts: &Parts) -> Option<&Session> {
    parts.extensions.get::<Session>()
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    session(parts)?
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn current_admin(parts: &Parts) -> Result<CurrentAdmin, AppError> {
    let Some(session) = session(parts) else {
        return Err(AppError::Unauthorized("Admin login required".to_string()));
    };
    session
        .get::<CurrentAdmin>(keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| AppError::Unauthorized("Admin login required".to_string()))
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Login required".to_string()))
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_admin(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdminWrite
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        if !admin.role.can_write() {
            return Err(AppError::Forbidden(
                "Your role does not allow changes".to_string(),
            ));
        }
        Ok(Self(admin))
    }
}

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        if admin.role != aurelia_core::AdminRole::SuperAdmin {
            return Err(AppError::Forbidden("Super admin required".to_string()));
        }
        Ok(Self(admin))
    }
}

/// Store the logged-in customer in the session.
///
/// The session ID is cycled first to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Remove the customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    Ok(())
}

/// Store the logged-in admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_ADMIN, admin).await
}

/// Remove the admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentAdmin>(keys::CURRENT_ADMIN).await?;
    Ok(())
}
