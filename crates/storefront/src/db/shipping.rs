//! Shipment repository.
//!
//! Tracking history is stored as a JSON array on the shipping row and always
//! rewritten through [`TrackingHistory::push`] so it stays chronological.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use aurelia_core::tracking::{TrackingEvent, TrackingHistory};
use aurelia_core::{OrderId, ShippingId, ShippingStatus};

use super::RepositoryError;
use crate::models::Shipment;

/// Carrier recorded on new shipments.
pub const DEFAULT_CARRIER: &str = "Aurelia Express";

const SHIPMENT_SELECT: &str = "
    SELECT s.id, s.order_id, o.order_number, s.tracking_number, s.carrier, s.status,
           s.history, s.created_at, s.updated_at
    FROM shop.shipping s
    JOIN shop.orders o ON o.id = s.order_id";

#[derive(Debug, sqlx::FromRow)]
struct ShipmentRow {
    id: i32,
    order_id: i32,
    order_number: String,
    tracking_number: String,
    carrier: String,
    status: ShippingStatus,
    history: Json<TrackingHistory>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ShipmentRow> for Shipment {
    fn from(row: ShipmentRow) -> Self {
        Self {
            id: ShippingId::new(row.id),
            order_id: OrderId::new(row.order_id),
            order_number: row.order_number,
            tracking_number: row.tracking_number,
            carrier: row.carrier,
            status: row.status,
            history: row.history.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for shipment operations.
pub struct ShippingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShippingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a shipment by tracking number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<Shipment>, RepositoryError> {
        let row = sqlx::query_as::<_, ShipmentRow>(&format!(
            "{SHIPMENT_SELECT} WHERE s.tracking_number = $1"
        ))
        .bind(tracking_number)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Shipment::from))
    }

    /// Shipment for an order, if one was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_order(&self, order_id: OrderId) -> Result<Option<Shipment>, RepositoryError> {
        let row = sqlx::query_as::<_, ShipmentRow>(&format!("{SHIPMENT_SELECT} WHERE s.order_id = $1"))
            .bind(order_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Shipment::from))
    }

    /// Append a history event and move the shipment to the event's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tracking number is unknown.
    pub async fn add_event(
        &self,
        tracking_number: &str,
        event: TrackingEvent,
    ) -> Result<Shipment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar("SELECT id FROM shop.shipping WHERE tracking_number = $1")
            .bind(tracking_number)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        append_event(&mut tx, ShippingId::new(id), event).await?;
        tx.commit().await?;

        self.get_by_tracking_number(tracking_number)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

/// Create the shipment for a new order.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the tracking number is taken.
pub async fn insert_shipment(
    conn: &mut PgConnection,
    order_id: OrderId,
    tracking_number: &str,
    history: &TrackingHistory,
) -> Result<ShippingId, RepositoryError> {
    let status = history.current_status().unwrap_or_default();
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO shop.shipping (order_id, tracking_number, carrier, status, history)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(order_id)
    .bind(tracking_number)
    .bind(DEFAULT_CARRIER)
    .bind(status)
    .bind(Json(history))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::unique(e, "tracking number"))?;

    Ok(ShippingId::new(id))
}

/// Append an event to the shipment of `order_id`. Orders without a shipment
/// are left alone.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn append_event_for_order(
    conn: &mut PgConnection,
    order_id: OrderId,
    event: TrackingEvent,
) -> Result<(), RepositoryError> {
    let id: Option<i32> = sqlx::query_scalar("SELECT id FROM shop.shipping WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

    match id {
        Some(id) => append_event(conn, ShippingId::new(id), event).await,
        None => Ok(()),
    }
}

async fn append_event(
    conn: &mut PgConnection,
    id: ShippingId,
    event: TrackingEvent,
) -> Result<(), RepositoryError> {
    let Json(mut history): Json<TrackingHistory> =
        sqlx::query_scalar("SELECT history FROM shop.shipping WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

    history.push(event);
    let status = history.current_status().unwrap_or_default();

    sqlx::query(
        "UPDATE shop.shipping SET history = $2, status = $3, updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .bind(Json(&history))
    .bind(status)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
