//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use aurelia_core::{AdminId, AdminRole, Email, UserId, Username};

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    pub username: Username,
    /// User's email address.
    pub email: Email,
}

/// Session-stored back-office identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminId,
    pub username: Username,
    pub email: Email,
    /// Role at login time. Role changes apply on next login.
    pub role: AdminRole,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the anonymous cart token (UUID).
    pub const CART_TOKEN: &str = "cart_token";
}
