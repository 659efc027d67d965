//! Order message repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use aurelia_core::{MessageSender, OrderId, OrderMessageId};

use super::RepositoryError;
use crate::models::OrderMessage;

const MESSAGE_COLUMNS: &str = "id, order_id, sender, author_name, body, image_url, created_at";

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i32,
    order_id: i32,
    sender: MessageSender,
    author_name: String,
    body: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for OrderMessage {
    fn from(row: MessageRow) -> Self {
        Self {
            id: OrderMessageId::new(row.id),
            order_id: OrderId::new(row.order_id),
            sender: row.sender,
            author_name: row.author_name,
            body: row.body,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

/// Repository for order messages.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Messages on an order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, order_id: OrderId) -> Result<Vec<OrderMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM shop.order_messages
             WHERE order_id = $1
             ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderMessage::from).collect())
    }

    /// Post a message on an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn create(
        &self,
        order_id: OrderId,
        sender: MessageSender,
        author_name: &str,
        body: &str,
        image_url: Option<&str>,
    ) -> Result<OrderMessage, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "INSERT INTO shop.order_messages (order_id, sender, author_name, body, image_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(order_id)
        .bind(sender)
        .bind(author_name)
        .bind(body)
        .bind(image_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or_missing(e, "message"))?;

        Ok(OrderMessage::from(row))
    }
}
