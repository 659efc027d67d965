//! Admin account management.
//!
//! # Usage
//!
//! ```bash
//! AURELIA_ADMIN_PASSWORD='...' au-cli admin create -u jane -e jane@aurelia.shop -r super_admin
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `AURELIA_ADMIN_PASSWORD` - Password for the new account

use aurelia_core::AdminRole;
use aurelia_storefront::services::auth::{AuthError, AuthService};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::{ConnectError, connect};

/// Variable holding the new admin's password.
pub const PASSWORD_VAR: &str = "AURELIA_ADMIN_PASSWORD";

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Validation failures, duplicates and database errors.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Parse a role name as given on the command line.
fn parse_role(role: &str) -> Result<AdminRole, AdminError> {
    role.parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))
}

/// Create a new admin account.
///
/// # Errors
///
/// Returns `AdminError` for an invalid role, a missing password, invalid
/// username/email/password, or an existing account.
pub async fn create(username: &str, email: &str, role: &str) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let role = parse_role(role)?;
    let password = std::env::var(PASSWORD_VAR)
        .map(SecretString::from)
        .map_err(|_| AdminError::MissingEnvVar(PASSWORD_VAR))?;

    let pool = connect().await?;

    tracing::info!("Creating admin account: {} ({})", username, role);
    let admin = AuthService::new(&pool)
        .create_admin(username, email, password.expose_secret(), role)
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Username: {}, Role: {}",
        admin.id,
        admin.username,
        admin.role
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("super_admin").unwrap(), AdminRole::SuperAdmin);
        assert_eq!(parse_role("viewer").unwrap(), AdminRole::Viewer);
        assert!(matches!(parse_role("owner"), Err(AdminError::InvalidRole(_))));
    }
}
