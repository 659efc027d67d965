//! Order placement.
//!
//! Checkout runs in a single transaction: lock the cart lines and each
//! product's stock row, snapshot the lines into the order, create the
//! shipment, then clear the cart. Any failure rolls everything back.

use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use aurelia_core::inventory::InventoryError;
use aurelia_core::pricing::{OrderTotals, PricedLine, ShippingPolicy};
use aurelia_core::tracking::{TrackingEvent, TrackingHistory};
use aurelia_core::{Email, EmailError, Money, PaymentMethod, ShippingStatus, Sku};

use crate::db::orders::{NewOrder, insert_order};
use crate::db::{CartRepository, RepositoryError, ShippingRepository, carts, inventory, shipping};
use crate::models::{CartLine, CartOwner, CurrentUser, OrderDetail, OrderItem, ShippingAddress};
use crate::services::numbers;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("email is required for guest checkout")]
    MissingEmail,
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("shipping address is missing {0}")]
    MissingAddressField(&'static str),
    #[error("{sku} is out of stock (requested {requested}, available {available})")]
    OutOfStock {
        sku: Sku,
        requested: u32,
        available: i32,
    },
    #[error("order total exceeds {}", Money::MAX)]
    TotalTooLarge,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Checkout form contents.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub email: Option<String>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Snapshot cart lines into order items.
fn snapshot(lines: &[CartLine]) -> (Vec<OrderItem>, Vec<PricedLine>) {
    lines
        .iter()
        .map(|line| {
            let item = OrderItem {
                product_id: line.product_id,
                sku: line.sku.clone(),
                name: line.name.clone(),
                image: line.image.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_total: line.line_total,
            };
            (item, line.priced())
        })
        .unzip()
}

/// Pick the order email: the customer's account email, else the form field.
fn resolve_email(customer: Option<&CurrentUser>, email: Option<&str>) -> Result<Email, CheckoutError> {
    if let Some(customer) = customer {
        return Ok(customer.email.clone());
    }
    match email.map(str::trim).filter(|s| !s.is_empty()) {
        Some(email) => Ok(Email::parse(email)?),
        None => Err(CheckoutError::MissingEmail),
    }
}

/// Totals for the priced lines, refusing orders too large to store.
fn checked_totals(priced: &[PricedLine], policy: &ShippingPolicy) -> Result<OrderTotals, CheckoutError> {
    let totals = OrderTotals::compute(priced, policy);
    totals
        .total
        .checked()
        .map_err(|_| CheckoutError::TotalTooLarge)?;
    Ok(totals)
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    policy: &'a ShippingPolicy,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: &'a ShippingPolicy) -> Self {
        Self { pool, policy }
    }

    /// Turn the owner's cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to order.
    /// Returns `CheckoutError::OutOfStock` if any line exceeds stock on hand.
    /// Returns `CheckoutError::MissingEmail` for a guest without an email.
    /// Returns `CheckoutError::TotalTooLarge` if the total cannot be stored.
    pub async fn place_order(
        &self,
        owner: CartOwner,
        customer: Option<&CurrentUser>,
        request: &CheckoutRequest,
    ) -> Result<OrderDetail, CheckoutError> {
        let email = resolve_email(customer, request.email.as_deref())?;
        if let Some(field) = request.shipping_address.missing_field() {
            return Err(CheckoutError::MissingAddressField(field));
        }

        let cart_id = CartRepository::new(self.pool)
            .find(owner)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;

        let mut tx = self.pool.begin().await?;

        let mut lines = carts::lock_lines(&mut tx, cart_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        // Stock rows are always locked in product order.
        lines.sort_by_key(|line| line.product_id);

        for line in &lines {
            let level = inventory::lock_level(&mut tx, line.product_id).await?;
            let available = level.map_or(0, |l| l.quantity);
            let reserved = level
                .ok_or(InventoryError::Insufficient {
                    requested: line.quantity,
                    available,
                })
                .and_then(|l| l.reserve(line.quantity))
                .map_err(|_| CheckoutError::OutOfStock {
                    sku: line.sku.clone(),
                    requested: line.quantity,
                    available,
                })?;
            inventory::write_quantity(&mut tx, line.product_id, reserved.quantity).await?;
        }

        let (items, priced) = snapshot(&lines);
        let totals = checked_totals(&priced, self.policy)?;
        let now = Utc::now();
        let order_number = numbers::order_number(now.date_naive());
        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let order = insert_order(
            &mut tx,
            &NewOrder {
                order_number: &order_number,
                user_id: customer.map(|c| c.id),
                email: &email,
                items: &items,
                shipping_address: &request.shipping_address,
                payment_method: request.payment_method,
                subtotal: totals.subtotal,
                shipping_cost: totals.shipping,
                total: totals.total,
                notes,
            },
        )
        .await?;

        let mut history = TrackingHistory::new();
        history.push(TrackingEvent::new(
            ShippingStatus::LabelCreated,
            "Shipping label created",
            now,
        ));
        let tracking_number = numbers::tracking_number();
        shipping::insert_shipment(&mut tx, order.id, &tracking_number, &history).await?;

        carts::clear_lines(&mut tx, cart_id).await?;

        tx.commit().await?;

        tracing::info!(
            order_number = %order.order_number,
            items = totals.item_count,
            total = %order.total,
            guest = customer.is_none(),
            "Order placed"
        );

        let shipment = ShippingRepository::new(self.pool).get_for_order(order.id).await?;
        Ok(OrderDetail {
            order,
            shipping: shipment,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aurelia_core::{CartItemId, ProductId, Slug, UserId, Username};
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: i32, unit_cents: u32, quantity: u32) -> CartLine {
        let unit = Money::from_cents(unit_cents);
        CartLine {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            sku: Sku::parse(&format!("AU-{id:03}")).unwrap(),
            name: format!("Ring {id}"),
            slug: Slug::parse(&format!("ring-{id}")).unwrap(),
            image: None,
            unit_price: unit,
            quantity,
            line_total: unit * quantity,
            in_stock: true,
        }
    }

    #[test]
    fn test_order_total_adds_shipping_below_threshold() {
        let policy = ShippingPolicy::default();
        let (items, priced) = snapshot(&[line(1, 4_000, 2), line(2, 2_550, 1)]);
        let totals = OrderTotals::compute(&priced, &policy);

        assert_eq!(items.len(), 2);
        assert_eq!(totals.subtotal.amount(), Decimal::new(10_550, 2));
        assert_eq!(totals.shipping.amount(), Decimal::new(1_500, 2));
        assert_eq!(totals.total.amount(), Decimal::new(12_050, 2));
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn test_order_total_free_shipping_at_threshold() {
        let policy = ShippingPolicy::default();
        let (_, priced) = snapshot(&[line(1, 7_500, 2)]);
        let totals = OrderTotals::compute(&priced, &policy);

        assert!(totals.shipping.is_zero());
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn test_total_over_storable_maximum_is_rejected() {
        let policy = ShippingPolicy::default();
        let unit = Money::new(Decimal::new(999_999_900, 2)).unwrap();
        let heavy = CartLine {
            unit_price: unit,
            line_total: unit * 20,
            ..line(1, 0, 20)
        };
        let (_, priced) = snapshot(&[heavy]);
        assert!(matches!(
            checked_totals(&priced, &policy),
            Err(CheckoutError::TotalTooLarge)
        ));

        let (_, priced) = snapshot(&[line(2, 4_000, 2)]);
        assert!(checked_totals(&priced, &policy).is_ok());
    }

    #[test]
    fn test_snapshot_copies_line_prices() {
        let (items, _) = snapshot(&[line(7, 1_999, 3)]);
        let item = items.first().unwrap();
        assert_eq!(item.product_id, ProductId::new(7));
        assert_eq!(item.unit_price, Money::from_cents(1_999));
        assert_eq!(item.line_total, Money::from_cents(5_997));
    }

    #[test]
    fn test_resolve_email() {
        let customer = CurrentUser {
            id: UserId::new(1),
            username: Username::parse("ines").unwrap(),
            email: Email::parse("ines@example.com").unwrap(),
        };
        assert_eq!(
            resolve_email(Some(&customer), Some("other@example.com"))
                .unwrap()
                .as_str(),
            "ines@example.com"
        );
        assert_eq!(
            resolve_email(None, Some(" Guest@Example.com ")).unwrap().as_str(),
            "guest@example.com"
        );
        assert!(matches!(
            resolve_email(None, Some("  ")),
            Err(CheckoutError::MissingEmail)
        ));
        assert!(matches!(
            resolve_email(None, Some("nope")),
            Err(CheckoutError::InvalidEmail(_))
        ));
    }
}
