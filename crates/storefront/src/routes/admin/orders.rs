//! Order, shipment and order-message management.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use aurelia_core::tracking::TrackingEvent;
use aurelia_core::{MessageSender, OrderId, OrderStatus, ShippingStatus};

use crate::db::{MessageRepository, OrderRepository, ShippingRepository};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireAdminWrite};
use crate::models::{Order, OrderDetail, OrderMessage, Page, Pagination, Shipment};
use crate::routes::orders::NewMessageRequest;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// Body of `POST /api/admin/shipping/{tracking_number}/events`.
#[derive(Debug, Deserialize)]
pub struct TrackingEventRequest {
    pub status: ShippingStatus,
    pub location: Option<String>,
    pub description: String,
    /// Defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TrackingEventRequest {
    fn into_event(self) -> Result<TrackingEvent> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(AppError::BadRequest("Description is required".to_string()));
        }
        let event = TrackingEvent::new(
            self.status,
            description,
            self.occurred_at.unwrap_or_else(Utc::now),
        );
        Ok(match self.location.as_deref().map(str::trim) {
            Some(location) if !location.is_empty() => event.with_location(location),
            _ => event,
        })
    }
}

async fn find_order(state: &AppState, id: OrderId) -> Result<Order> {
    OrderRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))
}

/// `GET /api/admin/orders?status=pending`
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<Page<Order>>> {
    let page = Pagination::new(query.page, query.per_page).ok_or_else(|| {
        AppError::BadRequest("page must be at least 1 and per_page 1 to 100".to_string())
    })?;
    let orders = OrderRepository::new(state.pool())
        .list(query.status, page)
        .await?;
    Ok(Json(orders))
}

/// `GET /api/admin/orders/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = find_order(&state, id).await?;
    let shipping = ShippingRepository::new(state.pool())
        .get_for_order(order.id)
        .await?;
    Ok(Json(OrderDetail { order, shipping }))
}

/// Move an order along its lifecycle.
///
/// `PATCH /api/admin/orders/{id}/status`
#[instrument(skip(state, admin))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, body.status)
        .await?;
    let shipping = ShippingRepository::new(state.pool())
        .get_for_order(order.id)
        .await?;

    tracing::info!(admin = %admin.username, order_id = %id, status = %body.status, "Order status updated by admin");
    Ok(Json(OrderDetail { order, shipping }))
}

/// Record a carrier scan or delivery event.
///
/// `POST /api/admin/shipping/{tracking_number}/events`
#[instrument(skip(state, admin, body))]
pub async fn add_tracking_event(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(tracking_number): ApiPath<String>,
    ApiJson(body): ApiJson<TrackingEventRequest>,
) -> Result<Json<Shipment>> {
    let event = body.into_event()?;
    let tracking_number = tracking_number.trim().to_ascii_uppercase();
    let shipment = ShippingRepository::new(state.pool())
        .add_event(&tracking_number, event)
        .await?;

    tracing::info!(
        admin = %admin.username,
        tracking_number = %shipment.tracking_number,
        status = %shipment.status,
        "Tracking event recorded"
    );
    Ok(Json(shipment))
}

/// `GET /api/admin/orders/{id}/messages`
#[instrument(skip(state, _admin))]
pub async fn list_messages(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Vec<OrderMessage>>> {
    let order = find_order(&state, id).await?;
    let messages = MessageRepository::new(state.pool()).list(order.id).await?;
    Ok(Json(messages))
}

/// Reply to a customer on an order.
///
/// `POST /api/admin/orders/{id}/messages`
#[instrument(skip(state, admin, request))]
pub async fn post_message(
    State(state): State<AppState>,
    RequireAdminWrite(admin): RequireAdminWrite,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(request): ApiJson<NewMessageRequest>,
) -> Result<(StatusCode, Json<OrderMessage>)> {
    let (body, image_url) = request.validated()?;
    let order = find_order(&state, id).await?;

    let message = MessageRepository::new(state.pool())
        .create(
            order.id,
            MessageSender::Admin,
            admin.username.as_str(),
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

    fn request(location: Option<&str>, description: &str) -> TrackingEventRequest {
        TrackingEventRequest {
            status: ShippingStatus::OutForDelivery,
            location: location.map(str::to_string),
            description: description.to_string(),
            occurred_at: None,
        }
    }

    #[test]
    fn test_event_with_location() {
        let event = request(Some(" Lyon hub "), "Out for delivery").into_event().unwrap();
        assert_eq!(event.status, ShippingStatus::OutForDelivery);
        assert_eq!(event.location.as_deref(), Some("Lyon hub"));
        assert_eq!(event.description, "Out for delivery");
    }

    #[test]
    fn test_blank_location_dropped() {
        let event = request(Some("  "), "Scanned").into_event().unwrap();
        assert_eq!(event.location, None);
    }

    #[test]
    fn test_blank_description_rejected() {
        assert!(request(None, " ").into_event().is_err());
    }

    #[test]
    fn test_status_request_parses_snake_case() {
        let body: StatusRequest = serde_json::from_str(r#"{"status":"shipped"}"#).unwrap();
        assert_eq!(body.status, OrderStatus::Shipped);
    }
}
