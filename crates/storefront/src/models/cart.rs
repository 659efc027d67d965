//! Cart domain types.

use serde::Serialize;
use uuid::Uuid;

use aurelia_core::pricing::{OrderTotals, PricedLine, ShippingPolicy, line_total};
use aurelia_core::{CartItemId, Money, ProductId, Sku, Slug, UserId};

/// Who a cart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOwner {
    /// A signed-in customer.
    User(UserId),
    /// An anonymous session, keyed by the token stored in the session.
    Guest(Uuid),
}

/// One cart line joined with its product.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub slug: Slug,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    pub in_stock: bool,
}

impl CartLine {
    #[must_use]
    pub const fn priced(&self) -> PricedLine {
        PricedLine::new(self.unit_price, self.quantity)
    }
}

/// A cart with its totals, as returned by the cart endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub free_shipping_threshold: Money,
    pub remaining_for_free_shipping: Money,
}

impl CartView {
    /// Price the lines under the given shipping policy.
    #[must_use]
    pub fn new(mut items: Vec<CartLine>, policy: &ShippingPolicy) -> Self {
        for line in &mut items {
            line.line_total = line_total(line.unit_price, line.quantity);
        }
        let priced: Vec<PricedLine> = items.iter().map(CartLine::priced).collect();
        let totals = OrderTotals::compute(&priced, policy);
        Self {
            items,
            item_count: totals.item_count,
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            total: totals.total,
            free_shipping_threshold: policy.free_threshold,
            remaining_for_free_shipping: policy.remaining_for_free_shipping(totals.subtotal),
        }
    }

    #[must_use]
    pub fn empty(policy: &ShippingPolicy) -> Self {
        Self::new(Vec::new(), policy)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, cents: u32, quantity: u32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            sku: Sku::parse(&format!("RNG-{id:03}")).unwrap(),
            name: format!("Ring {id}"),
            slug: Slug::parse(&format!("ring-{id}")).unwrap(),
            image: None,
            unit_price: Money::from_cents(cents),
            quantity,
            line_total: Money::ZERO,
            in_stock: true,
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let view = CartView::new(vec![line(1, 4_500, 2), line(2, 2_000, 1)], &ShippingPolicy::default());
        assert_eq!(view.item_count, 3);
        assert_eq!(view.items[0].line_total, Money::from_cents(9_000));
        assert_eq!(view.subtotal, Money::from_cents(11_000));
        assert_eq!(view.shipping, Money::from_cents(1_500));
        assert_eq!(view.total, Money::from_cents(12_500));
        assert_eq!(view.remaining_for_free_shipping, Money::from_cents(4_000));
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::empty(&ShippingPolicy::default());
        assert!(view.items.is_empty());
        assert_eq!(view.total, Money::ZERO);
        assert_eq!(view.free_shipping_threshold, Money::from_cents(15_000));
    }
}
