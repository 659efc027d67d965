//! Customer order routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aurelia_core::MessageSender;

use crate::db::orders::StatusChangeError;
use crate::db::{MessageRepository, OrderRepository, ShippingRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::{CurrentUser, Order, OrderDetail, OrderMessage};
use crate::routes::cart::cart_owner;
use crate::services::checkout::{CheckoutError, CheckoutRequest, CheckoutService};
use crate::state::AppState;

/// Longest accepted order message, in characters.
pub const MAX_ORDER_MESSAGE_CHARS: usize = 2000;

/// Body of a new order message.
#[derive(Debug, Deserialize)]
pub struct NewMessageRequest {
    pub body: String,
    pub image_url: Option<String>,
}

impl NewMessageRequest {
    /// Trimmed body and image URL, rejecting empty or oversized bodies.
    pub(crate) fn validated(&self) -> Result<(&str, Option<&str>)> {
        let body = self.body.trim();
        if body.is_empty() {
            return Err(AppError::BadRequest("Message body is required".to_string()));
        }
        if body.chars().count() > MAX_ORDER_MESSAGE_CHARS {
            return Err(AppError::BadRequest(format!(
                "Message must be at most {MAX_ORDER_MESSAGE_CHARS} characters"
            )));
        }
        let image_url = self
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        Ok((body, image_url))
    }
}

/// Load an order owned by `customer`. Other customers' orders look missing.
async fn owned_order(state: &AppState, customer: &CurrentUser, order_number: &str) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get_by_number(order_number)
        .await?
        .filter(|order| order.user_id == Some(customer.id))
        .ok_or_else(|| AppError::NotFound(format!("Order {order_number} not found")))
}

async fn with_shipping(state: &AppState, order: Order) -> Result<OrderDetail> {
    let shipping = ShippingRepository::new(state.pool())
        .get_for_order(order.id)
        .await?;
    Ok(OrderDetail { order, shipping })
}

/// Place an order from the current cart.
///
/// `POST /api/orders`
#[instrument(skip(state, session, user, request))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let owner = cart_owner(&session, user.as_ref())
        .await?
        .ok_or(CheckoutError::EmptyCart)?;

    let detail = CheckoutService::new(state.pool(), &state.config().shipping)
        .place_order(owner, user.as_ref(), &request)
        .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", detail.order.order_number.as_str())]),
    );

    Ok((StatusCode::CREATED, Json(detail)))
}

/// The customer's orders, newest first.
///
/// `GET /api/orders`
#[instrument(skip(state, customer))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(customer): RequireUser,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(customer.id)
        .await?;
    Ok(Json(orders))
}

/// `GET /api/orders/{order_number}`
#[instrument(skip(state, customer))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(customer): RequireUser,
    ApiPath(order_number): ApiPath<String>,
) -> Result<Json<OrderDetail>> {
    let order = owned_order(&state, &customer, &order_number).await?;
    Ok(Json(with_shipping(&state, order).await?))
}

/// Cancel an order that has not started processing.
///
/// `POST /api/orders/{order_number}/cancel`
#[instrument(skip(state, customer))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(customer): RequireUser,
    ApiPath(order_number): ApiPath<String>,
) -> Result<Json<OrderDetail>> {
    let order = owned_order(&state, &customer, &order_number).await?;

    let order = OrderRepository::new(state.pool())
        .cancel_pending(order.id)
        .await
        .map_err(|e| match e {
            StatusChangeError::NotInStatus { actual, .. } => AppError::BadRequest(format!(
                "Order {order_number} is {actual} and can no longer be cancelled"
            )),
            other => other.into(),
        })?;
    tracing::info!(order_number = %order.order_number, "Order cancelled by customer");

    Ok(Json(with_shipping(&state, order).await?))
}

/// `GET /api/orders/{order_number}/messages`
#[instrument(skip(state, customer))]
pub async fn list_messages(
    State(state): State<AppState>,
    RequireUser(customer): RequireUser,
    ApiPath(order_number): ApiPath<String>,
) -> Result<Json<Vec<OrderMessage>>> {
    let order = owned_order(&state, &customer, &order_number).await?;
    let messages = MessageRepository::new(state.pool()).list(order.id).await?;
    Ok(Json(messages))
}

/// `POST /api/orders/{order_number}/messages`
#[instrument(skip(state, customer, request))]
pub async fn post_message(
    State(state): State<AppState>,
    RequireUser(customer): RequireUser,
    ApiPath(order_number): ApiPath<String>,
    ApiJson(request): ApiJson<NewMessageRequest>,
) -> Result<(StatusCode, Json<OrderMessage>)> {
    let (body, image_url) = request.validated()?;
    let order = owned_order(&state, &customer, &order_number).await?;

    let message = MessageRepository::new(state.pool())
        .create(
            order.id,
            MessageSender::Customer,
            customer.username.as_str(),
            body,
            image_url,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(body: &str, image_url: Option<&str>) -> NewMessageRequest {
        NewMessageRequest {
            body: body.to_string(),
            image_url: image_url.map(str::to_string),
        }
    }

    #[test]
    fn test_message_is_trimmed() {
        let req = request("  Where is my parcel?  ", Some("  "));
        let (body, image) = req.validated().unwrap();
        assert_eq!(body, "Where is my parcel?");
        assert_eq!(image, None);
    }

    #[test]
    fn test_blank_message_rejected() {
        assert!(matches!(
            request("   ", None).validated(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_long_message_rejected() {
        let long = "a".repeat(MAX_ORDER_MESSAGE_CHARS + 1);
        assert!(request(&long, None).validated().is_err());
        let max = "a".repeat(MAX_ORDER_MESSAGE_CHARS);
        assert!(request(&max, None).validated().is_ok());
    }
}
