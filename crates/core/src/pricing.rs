//! Cart and order pricing.
//!
//! Totals are plain reductions: each line contributes `unit price × quantity`,
//! and a flat shipping charge applies while the subtotal is under the
//! free-shipping threshold.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// The price a customer actually pays for one unit.
///
/// A sale price only applies when it is positive and below the list price.
#[must_use]
pub fn unit_price(price: Money, sale_price: Option<Money>) -> Money {
    match sale_price {
        Some(sale) if !sale.is_zero() && sale < price => sale,
        _ => price,
    }
}

/// Whole-number percentage saved by the sale price, if any.
#[must_use]
pub fn discount_percent(price: Money, sale_price: Option<Money>) -> Option<u8> {
    let effective = unit_price(price, sale_price);
    if effective >= price || price.is_zero() {
        return None;
    }
    let saved = (price.amount() - effective.amount()) / price.amount() * Decimal::ONE_HUNDRED;
    saved.round().to_u8()
}

/// Price of `quantity` units at `unit`.
#[must_use]
pub fn line_total(unit: Money, quantity: u32) -> Money {
    unit * quantity
}

/// Shipping charge rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Subtotals at or above this ship free.
    pub free_threshold: Money,
    /// Charged when the subtotal is below the threshold.
    pub flat_rate: Money,
}

impl ShippingPolicy {
    #[must_use]
    pub const fn new(free_threshold: Money, flat_rate: Money) -> Self {
        Self {
            free_threshold,
            flat_rate,
        }
    }

    /// Shipping charge for a given subtotal. Empty carts ship free.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal.is_zero() || subtotal >= self.free_threshold {
            Money::ZERO
        } else {
            self.flat_rate
        }
    }

    /// How much more the customer must spend to ship free.
    #[must_use]
    pub fn remaining_for_free_shipping(&self, subtotal: Money) -> Money {
        self.free_threshold.saturating_sub(subtotal)
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self::new(Money::from_cents(15_000), Money::from_cents(1_500))
    }
}

/// A priced line as seen by the totals calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: Money,
    pub quantity: u32,
}

impl PricedLine {
    #[must_use]
    pub const fn new(unit_price: Money, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    #[must_use]
    pub fn total(&self) -> Money {
        line_total(self.unit_price, self.quantity)
    }
}

/// Computed totals for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub item_count: u32,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Sum the lines and apply the shipping policy.
    #[must_use]
    pub fn compute(lines: &[PricedLine], policy: &ShippingPolicy) -> Self {
        let subtotal: Money = lines.iter().map(PricedLine::total).sum();
        let item_count = lines.iter().map(|l| l.quantity).sum();
        let shipping = policy.shipping_for(subtotal);
        Self {
            item_count,
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usd(cents: u32) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn test_unit_price_prefers_lower_sale_price() {
        assert_eq!(unit_price(usd(10_000), Some(usd(8_000))), usd(8_000));
        assert_eq!(unit_price(usd(10_000), None), usd(10_000));
        assert_eq!(unit_price(usd(10_000), Some(usd(12_000))), usd(10_000));
        assert_eq!(unit_price(usd(10_000), Some(Money::ZERO)), usd(10_000));
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(discount_percent(usd(10_000), Some(usd(7_500))), Some(25));
        assert_eq!(discount_percent(usd(30_000), Some(usd(20_000))), Some(33));
        assert_eq!(discount_percent(usd(10_000), None), None);
    }

    #[test]
    fn test_total_below_threshold_adds_shipping() {
        let policy = ShippingPolicy::new(usd(15_000), usd(1_500));
        let lines = [PricedLine::new(usd(4_000), 2), PricedLine::new(usd(2_500), 1)];
        let totals = OrderTotals::compute(&lines, &policy);

        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.subtotal, usd(10_500));
        assert_eq!(totals.shipping, usd(1_500));
        assert_eq!(totals.total, usd(12_000));
    }

    #[test]
    fn test_total_at_threshold_ships_free() {
        let policy = ShippingPolicy::new(usd(15_000), usd(1_500));
        let lines = [PricedLine::new(usd(7_500), 2)];
        let totals = OrderTotals::compute(&lines, &policy);

        assert_eq!(totals.subtotal, usd(15_000));
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, usd(15_000));
    }

    #[test]
    fn test_total_equals_sum_of_lines_plus_shipping() {
        let policy = ShippingPolicy::default();
        let lines = [
            PricedLine::new(usd(1_999), 3),
            PricedLine::new(usd(4_550), 1),
            PricedLine::new(usd(100), 7),
        ];
        let totals = OrderTotals::compute(&lines, &policy);
        let expected_subtotal = usd(1_999 * 3 + 4_550 + 100 * 7);
        assert_eq!(totals.subtotal, expected_subtotal);
        assert_eq!(totals.total, expected_subtotal + policy.shipping_for(expected_subtotal));
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let totals = OrderTotals::compute(&[], &ShippingPolicy::default());
        assert_eq!(totals.item_count, 0);
        assert_eq!(totals.total, Money::ZERO);
    }

    #[test]
    fn test_remaining_for_free_shipping() {
        let policy = ShippingPolicy::new(usd(15_000), usd(1_500));
        assert_eq!(policy.remaining_for_free_shipping(usd(12_000)), usd(3_000));
        assert_eq!(policy.remaining_for_free_shipping(usd(20_000)), Money::ZERO);
    }
}
