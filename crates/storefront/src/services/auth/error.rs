//! Authentication error types.

use thiserror::Error;

use aurelia_core::{EmailError, UsernameError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// Wrong password or unknown login.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username or email already registered.
    #[error("{0}")]
    AlreadyExists(String),

    /// Password does not meet length requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Turn a repository conflict into `AlreadyExists`.
    pub(crate) fn from_create(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(msg) => Self::AlreadyExists(msg),
            other => Self::Repository(other),
        }
    }
}
