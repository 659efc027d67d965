//! Account domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aurelia_core::{AdminId, AdminRole, Email, UserId, Username};

use super::session::{CurrentAdmin, CurrentUser};

/// A customer account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Identity to store in the session.
    #[must_use]
    pub fn to_current(&self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// A back-office account.
#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: AdminId,
    pub username: Username,
    pub email: Email,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Admin {
    #[must_use]
    pub fn to_current(&self) -> CurrentAdmin {
        CurrentAdmin {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}
