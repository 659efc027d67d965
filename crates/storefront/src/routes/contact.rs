//! Contact form route handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use aurelia_core::Email;

use crate::db::ContactRepository;
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::models::ContactMessage;
use crate::models::contact::{MAX_MESSAGE_CHARS, NewContactMessage};
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ContactForm {
    fn into_message(self) -> Result<NewContactMessage> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        let message = self.message.trim();
        if message.is_empty() {
            return Err(AppError::BadRequest("Message is required".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::BadRequest(format!(
                "Message must be at most {MAX_MESSAGE_CHARS} characters"
            )));
        }
        let email = Email::parse(&self.email)
            .map_err(|_| AppError::BadRequest("Please enter a valid email address".to_string()))?;

        Ok(NewContactMessage {
            name: name.to_string(),
            email,
            phone: non_blank(self.phone),
            subject: non_blank(self.subject),
            message: message.to_string(),
        })
    }
}

/// Store a contact form submission.
///
/// `POST /api/contact`
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ContactForm>,
) -> Result<(StatusCode, Json<ContactMessage>)> {
    let new = form.into_message()?;
    let stored = ContactRepository::new(state.pool()).create(&new).await?;
    tracing::info!(message_id = %stored.id, "Contact message received");
    Ok((StatusCode::CREATED, Json(stored)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: " Ada ".to_string(),
            email: "Ada@Example.com".to_string(),
            phone: Some("  ".to_string()),
            subject: Some("Ring sizing".to_string()),
            message: "Do you resize rings?".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let msg = form().into_message().unwrap();
        assert_eq!(msg.name, "Ada");
        assert_eq!(msg.email.as_str(), "ada@example.com");
        assert_eq!(msg.phone, None);
        assert_eq!(msg.subject.as_deref(), Some("Ring sizing"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let f = ContactForm {
            name: "  ".to_string(),
            ..form()
        };
        assert!(matches!(f.into_message(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_empty_message_rejected() {
        let f = ContactForm {
            message: String::new(),
            ..form()
        };
        assert!(f.into_message().is_err());
    }

    #[test]
    fn test_oversized_message_rejected() {
        let f = ContactForm {
            message: "x".repeat(MAX_MESSAGE_CHARS + 1),
            ..form()
        };
        assert!(f.into_message().is_err());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let f = ContactForm {
            email: "not-an-email".to_string(),
            ..form()
        };
        assert!(f.into_message().is_err());
    }
}
