//! Back-office account repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use aurelia_core::{AdminId, AdminRole, Email, Username};

use super::RepositoryError;
use crate::models::Admin;

const ADMIN_COLUMNS: &str = "id, username, email, role, created_at, last_login_at";

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: i32,
    username: String,
    email: String,
    role: AdminRole,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<AdminRow> for Admin {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AdminId::new(row.id),
            username: Username::parse(&row.username)
                .map_err(|e| RepositoryError::corrupt("username", e))?,
            email: Email::parse(&row.email).map_err(|e| RepositoryError::corrupt("email", e))?,
            role: row.role,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminCredentialRow {
    #[sqlx(flatten)]
    admin: AdminRow,
    password_hash: String,
}

/// Repository for admin account operations.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up an admin and their password hash by username or email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        login: &str,
    ) -> Result<Option<(Admin, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminCredentialRow>(&format!(
            "SELECT {ADMIN_COLUMNS}, password_hash FROM shop.admins
             WHERE username = $1 OR email = LOWER($1)"
        ))
        .bind(login.trim())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((Admin::try_from(r.admin)?, r.password_hash)))
            .transpose()
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email is taken.
    pub async fn create(
        &self,
        username: &Username,
        email: &Email,
        password_hash: &str,
        role: AdminRole,
    ) -> Result<Admin, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "INSERT INTO shop.admins (username, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "username or email"))?;

        Admin::try_from(row)
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch_last_login(&self, id: AdminId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE shop.admins SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// List all admin accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Admin>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM shop.admins ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Admin::try_from).collect()
    }
}
