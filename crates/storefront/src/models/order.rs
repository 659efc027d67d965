//! Order, shipment and order message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aurelia_core::tracking::TrackingHistory;
use aurelia_core::{
    Email, MessageSender, Money, OrderId, OrderMessageId, OrderStatus, PaymentMethod, ProductId,
    ShippingId, ShippingStatus, Sku, UserId,
};

/// Line snapshot stored on the order at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

/// Delivery address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Name of the first required field that is blank.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("full_name", &self.full_name),
            ("line1", &self.line1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub email: Email,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order together with its shipment.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub shipping: Option<Shipment>,
}

/// Shipment record with its tracking history.
#[derive(Debug, Clone, Serialize)]
pub struct Shipment {
    pub id: ShippingId,
    pub order_id: OrderId,
    pub order_number: String,
    pub tracking_number: String,
    pub carrier: String,
    pub status: ShippingStatus,
    pub history: TrackingHistory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chat-style message attached to an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderMessage {
    pub id: OrderMessageId,
    pub order_id: OrderId,
    pub sender: MessageSender,
    pub author_name: String,
    pub body: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ines Duarte".to_string(),
            line1: "14 Rua das Flores".to_string(),
            line2: None,
            city: "Porto".to_string(),
            region: None,
            postal_code: "4050-262".to_string(),
            country: "PT".to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(address().missing_field(), None);
        let mut blank = address();
        blank.city = "  ".to_string();
        assert_eq!(blank.missing_field(), Some("city"));
    }

    #[test]
    fn test_order_item_snapshot_json() {
        let item = OrderItem {
            product_id: ProductId::new(3),
            sku: Sku::parse("NCK-014").unwrap(),
            name: "Pearl Drop Necklace".to_string(),
            image: None,
            unit_price: Money::from_cents(12_900),
            quantity: 2,
            line_total: Money::from_cents(25_800),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["unit_price"], "129.00");
        assert_eq!(json["line_total"], "258.00");
        let back: OrderItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
