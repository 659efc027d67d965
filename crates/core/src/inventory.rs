//! Per-product stock levels.

use serde::{Deserialize, Serialize};

/// Default reorder threshold for new inventory rows.
pub const DEFAULT_MIN_THRESHOLD: i32 = 5;

/// Errors from stock arithmetic.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryError {
    #[error("stock cannot go below zero (have {available}, change {delta})")]
    Negative { available: i32, delta: i32 },
    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: u32, available: i32 },
    #[error("threshold cannot be negative")]
    NegativeThreshold,
}

/// Quantity on hand plus the reorder threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub quantity: i32,
    pub min_threshold: i32,
}

impl StockLevel {
    /// # Errors
    ///
    /// Returns an error if either value is negative.
    pub const fn new(quantity: i32, min_threshold: i32) -> Result<Self, InventoryError> {
        if quantity < 0 {
            return Err(InventoryError::Negative {
                available: 0,
                delta: quantity,
            });
        }
        if min_threshold < 0 {
            return Err(InventoryError::NegativeThreshold);
        }
        Ok(Self {
            quantity,
            min_threshold,
        })
    }

    /// At or below the reorder threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_threshold
    }

    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    #[must_use]
    pub fn can_fulfil(&self, requested: u32) -> bool {
        i64::from(self.quantity) >= i64::from(requested)
    }

    /// Apply a signed adjustment (restock or write-off).
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Negative` if the result would drop below zero.
    pub fn adjust(self, delta: i32) -> Result<Self, InventoryError> {
        let negative = InventoryError::Negative {
            available: self.quantity,
            delta,
        };
        let quantity = self.quantity.checked_add(delta).ok_or(negative)?;
        if quantity < 0 {
            return Err(negative);
        }
        Ok(Self { quantity, ..self })
    }

    /// Remove units for a placed order.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Insufficient` when there is not enough stock.
    pub fn reserve(self, requested: u32) -> Result<Self, InventoryError> {
        let insufficient = InventoryError::Insufficient {
            requested,
            available: self.quantity,
        };
        let delta = i32::try_from(requested).map_err(|_| insufficient)?;
        if !self.can_fulfil(requested) {
            return Err(insufficient);
        }
        self.adjust(-delta).map_err(|_| insufficient)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_flag() {
        assert!(StockLevel::new(5, 5).unwrap().is_low_stock());
        assert!(StockLevel::new(0, 5).unwrap().is_low_stock());
        assert!(!StockLevel::new(6, 5).unwrap().is_low_stock());
    }

    #[test]
    fn test_out_of_stock() {
        assert!(StockLevel::new(0, 0).unwrap().is_out_of_stock());
        assert!(!StockLevel::new(1, 0).unwrap().is_out_of_stock());
    }

    #[test]
    fn test_adjust() {
        let level = StockLevel::new(10, 3).unwrap();
        assert_eq!(level.adjust(5).unwrap().quantity, 15);
        assert_eq!(level.adjust(-10).unwrap().quantity, 0);
        assert_eq!(
            level.adjust(-11),
            Err(InventoryError::Negative {
                available: 10,
                delta: -11
            })
        );
    }

    #[test]
    fn test_reserve_decrements() {
        let level = StockLevel::new(4, 2).unwrap();
        let after = level.reserve(3).unwrap();
        assert_eq!(after.quantity, 1);
        assert!(after.is_low_stock());
        assert_eq!(
            after.reserve(2),
            Err(InventoryError::Insufficient {
                requested: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_rejects_negative_values() {
        assert!(StockLevel::new(-1, 0).is_err());
        assert_eq!(StockLevel::new(1, -1), Err(InventoryError::NegativeThreshold));
    }
}
