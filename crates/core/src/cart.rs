//! Cart line quantity rules.
//!
//! The database stores one row per (cart, product). These helpers decide what
//! a mutation does to that row so the repository only has to apply it.

use std::collections::BTreeMap;

use crate::types::ProductId;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors from cart quantity arithmetic.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be at least 1")]
    Zero,
    #[error("quantity cannot exceed {max} per item")]
    TooLarge { max: u32 },
}

/// A validated line quantity in `1..=MAX_LINE_QUANTITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(u32);

impl Quantity {
    /// # Errors
    ///
    /// Returns `QuantityError` when `n` is 0 or above the per-line cap.
    pub const fn new(n: u32) -> Result<Self, QuantityError> {
        if n == 0 {
            Err(QuantityError::Zero)
        } else if n > MAX_LINE_QUANTITY {
            Err(QuantityError::TooLarge {
                max: MAX_LINE_QUANTITY,
            })
        } else {
            Ok(Self(n))
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// What should happen to a cart line row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// Keep the row with this quantity.
    Keep(Quantity),
    /// Delete the row.
    Delete,
}

/// Quantity after adding `added` units to a line that may not exist yet.
///
/// # Errors
///
/// Returns `QuantityError::TooLarge` when the sum exceeds the per-line cap.
pub const fn add_quantity(existing: Option<Quantity>, added: Quantity) -> Result<Quantity, QuantityError> {
    let current = match existing {
        Some(q) => q.get(),
        None => 0,
    };
    Quantity::new(current + added.get())
}

/// Result of removing units from a line.
///
/// `None` removes the whole line. Removing as many or more units than the
/// line holds deletes the row.
#[must_use]
pub fn remove_quantity(existing: Quantity, removed: Option<u32>) -> LineChange {
    match removed {
        None => LineChange::Delete,
        Some(n) => match existing.get().checked_sub(n) {
            Some(left) if left > 0 => Quantity::new(left).map_or(LineChange::Delete, LineChange::Keep),
            _ => LineChange::Delete,
        },
    }
}

/// Result of setting a line to an explicit quantity. Zero deletes the row.
///
/// # Errors
///
/// Returns `QuantityError::TooLarge` above the per-line cap.
pub const fn set_quantity(quantity: u32) -> Result<LineChange, QuantityError> {
    if quantity == 0 {
        return Ok(LineChange::Delete);
    }
    match Quantity::new(quantity) {
        Ok(q) => Ok(LineChange::Keep(q)),
        Err(e) => Err(e),
    }
}

/// Combine a signed-in user's cart with the anonymous cart from their session.
///
/// Quantities for the same product are summed and clamped to the per-line cap.
/// The result is ordered by product id.
#[must_use]
pub fn merge_lines(
    user_lines: &[(ProductId, Quantity)],
    guest_lines: &[(ProductId, Quantity)],
) -> Vec<(ProductId, Quantity)> {
    let mut merged: BTreeMap<ProductId, u32> = BTreeMap::new();
    for (product_id, quantity) in user_lines.iter().chain(guest_lines) {
        *merged.entry(*product_id).or_insert(0) += quantity.get();
    }
    merged
        .into_iter()
        .filter_map(|(product_id, n)| {
            Quantity::new(n.min(MAX_LINE_QUANTITY))
                .ok()
                .map(|q| (product_id, q))
        })
        .collect()
}

/// Total number of units across lines.
#[must_use]
pub fn item_count(quantities: impl IntoIterator<Item = Quantity>) -> u32 {
    quantities.into_iter().map(Quantity::get).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn q(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(100), Err(QuantityError::TooLarge { max: 99 }));
        assert_eq!(Quantity::new(99).unwrap().get(), 99);
    }

    #[test]
    fn test_adding_increases_count_by_quantity() {
        let before = [q(2), q(1)];
        let added = q(3);
        let updated = add_quantity(Some(before[0]), added).unwrap();

        let count_before = item_count(before);
        let count_after = item_count([updated, before[1]]);
        assert_eq!(count_after, count_before + added.get());
    }

    #[test]
    fn test_adding_new_line() {
        assert_eq!(add_quantity(None, q(4)).unwrap(), q(4));
    }

    #[test]
    fn test_adding_over_cap_fails() {
        assert_eq!(
            add_quantity(Some(q(98)), q(2)),
            Err(QuantityError::TooLarge { max: 99 })
        );
    }

    #[test]
    fn test_removing_last_instance_deletes_row() {
        assert_eq!(remove_quantity(q(1), Some(1)), LineChange::Delete);
        assert_eq!(remove_quantity(q(2), Some(5)), LineChange::Delete);
        assert_eq!(remove_quantity(q(3), None), LineChange::Delete);
    }

    #[test]
    fn test_removing_some_keeps_row() {
        assert_eq!(remove_quantity(q(3), Some(1)), LineChange::Keep(q(2)));
    }

    #[test]
    fn test_set_quantity() {
        assert_eq!(set_quantity(0), Ok(LineChange::Delete));
        assert_eq!(set_quantity(5), Ok(LineChange::Keep(q(5))));
        assert!(set_quantity(500).is_err());
    }

    #[test]
    fn test_merge_lines_sums_and_caps() {
        let ring = ProductId::new(1);
        let pendant = ProductId::new(2);
        let earrings = ProductId::new(3);

        let merged = merge_lines(
            &[(ring, q(2)), (pendant, q(90))],
            &[(pendant, q(20)), (earrings, q(1))],
        );

        assert_eq!(merged, vec![(ring, q(2)), (pendant, q(99)), (earrings, q(1))]);
    }
}
