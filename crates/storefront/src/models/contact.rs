//! Contact form submissions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aurelia_core::{ContactMessageId, Email};

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// A stored contact form submission.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A validated submission ready to store.
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}
