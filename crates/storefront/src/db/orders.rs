//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use aurelia_core::tracking::TrackingEvent;
use aurelia_core::{
    Email, Money, OrderId, OrderStatus, PaymentMethod, ShippingStatus, StatusTransitionError,
    UserId,
};

use super::{RepositoryError, inventory, shipping};
use crate::models::{Order, OrderItem, Page, Pagination, ShippingAddress};

const ORDER_COLUMNS: &str = "id, order_number, user_id, email, status, items, shipping_address,
    payment_method, subtotal, shipping_cost, total, notes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: Option<i32>,
    email: String,
    status: OrderStatus,
    items: Json<Vec<OrderItem>>,
    shipping_address: Json<ShippingAddress>,
    payment_method: PaymentMethod,
    subtotal: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let money = |amount: Decimal, what: &str| {
            Money::new(amount).map_err(|e| RepositoryError::corrupt(what, e))
        };
        Ok(Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            user_id: row.user_id.map(UserId::new),
            email: Email::parse(&row.email).map_err(|e| RepositoryError::corrupt("email", e))?,
            status: row.status,
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            payment_method: row.payment_method,
            subtotal: money(row.subtotal, "subtotal")?,
            shipping_cost: money(row.shipping_cost, "shipping cost")?,
            total: money(row.total, "total")?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Errors from changing an order's status.
#[derive(Debug, Error)]
pub enum StatusChangeError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Transition(#[from] StatusTransitionError),
    #[error("order is {actual}, not {expected}")]
    NotInStatus {
        expected: OrderStatus,
        actual: OrderStatus,
    },
}

impl From<sqlx::Error> for StatusChangeError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Values for a new order row.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub user_id: Option<UserId>,
    pub email: &'a Email,
    pub items: &'a [OrderItem],
    pub shipping_address: &'a ShippingAddress,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total: Money,
    pub notes: Option<&'a str>,
}

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// All orders, optionally filtered by status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: Pagination,
    ) -> Result<Page<Order>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.orders WHERE $1::shop.order_status IS NULL OR status = $1",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders
             WHERE $1::shop.order_status IS NULL OR status = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(Order::try_from)
                .collect::<Result<_, _>>()?,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    /// Get an order by its public number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Move an order to a new status.
    ///
    /// Shipping and delivery append a tracking event. Cancelling returns the
    /// ordered quantities to stock.
    ///
    /// # Errors
    ///
    /// Returns `StatusChangeError::Transition` for a disallowed change.
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, StatusChangeError> {
        self.change_status(id, None, next).await
    }

    /// Cancel an order only if it is still pending when its row is locked.
    ///
    /// # Errors
    ///
    /// Returns `StatusChangeError::NotInStatus` if the order has moved on.
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn cancel_pending(&self, id: OrderId) -> Result<Order, StatusChangeError> {
        self.change_status(id, Some(OrderStatus::Pending), OrderStatus::Cancelled)
            .await
    }

    async fn change_status(
        &self,
        id: OrderId,
        expected: Option<OrderStatus>,
        next: OrderStatus,
    ) -> Result<Order, StatusChangeError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        let order = Order::try_from(row)?;

        if let Some(expected) = expected.filter(|e| *e != order.status) {
            return Err(StatusChangeError::NotInStatus {
                expected,
                actual: order.status,
            });
        }
        order.status.transition_to(next)?;

        sqlx::query("UPDATE shop.orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        match next {
            OrderStatus::Shipped => {
                let event = TrackingEvent::new(ShippingStatus::InTransit, "Shipped", now);
                shipping::append_event_for_order(&mut tx, id, event).await?;
            }
            OrderStatus::Delivered => {
                let event = TrackingEvent::new(ShippingStatus::Delivered, "Delivered", now);
                shipping::append_event_for_order(&mut tx, id, event).await?;
            }
            OrderStatus::Cancelled => restock(&mut tx, &order.items).await?,
            OrderStatus::Pending | OrderStatus::Processing => {}
        }

        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            from = %order.status,
            to = %next,
            "Order status changed"
        );

        Ok(self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?)
    }
}

/// Insert an order row.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order number is taken.
pub async fn insert_order(conn: &mut PgConnection, new: &NewOrder<'_>) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO shop.orders
             (order_number, user_id, email, items, shipping_address, payment_method,
              subtotal, shipping_cost, total, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(new.order_number)
    .bind(new.user_id)
    .bind(new.email)
    .bind(Json(new.items))
    .bind(Json(new.shipping_address))
    .bind(new.payment_method)
    .bind(new.subtotal)
    .bind(new.shipping_cost)
    .bind(new.total)
    .bind(new.notes)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::unique(e, "order number"))?;

    Order::try_from(row)
}

/// Return ordered quantities to stock.
async fn restock(conn: &mut PgConnection, items: &[OrderItem]) -> Result<(), RepositoryError> {
    for item in items {
        let Some(level) = inventory::lock_level(conn, item.product_id).await? else {
            // Product deleted since the order was placed.
            continue;
        };
        let delta = i32::try_from(item.quantity)
            .map_err(|e| RepositoryError::corrupt("order quantity", e))?;
        let restocked = level
            .adjust(delta)
            .map_err(|e| RepositoryError::corrupt("stock level", e))?;
        inventory::write_quantity(conn, item.product_id, restocked.quantity).await?;
    }
    Ok(())
}
