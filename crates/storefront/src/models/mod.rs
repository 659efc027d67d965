//! Domain models for the storefront API.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Most of them serialize directly as API responses.

pub mod cart;
pub mod catalog;
pub mod contact;
pub mod favorite;
pub mod inventory;
pub mod order;
pub mod session;
pub mod user;

use serde::Serialize;

pub use cart::{CartLine, CartOwner, CartView};
pub use catalog::{Category, Product, ProductFilter, ProductSort, ProductSummary};
pub use contact::ContactMessage;
pub use favorite::Favorite;
pub use inventory::InventoryRecord;
pub use order::{Order, OrderDetail, OrderItem, OrderMessage, Shipment, ShippingAddress};
pub use session::{CurrentAdmin, CurrentUser};
pub use user::{Admin, User};

/// Default page size for paginated listings.
pub const DEFAULT_PER_PAGE: u32 = 24;
/// Largest accepted page size.
pub const MAX_PER_PAGE: u32 = 100;

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Validated pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Clamp raw query values. Pages start at 1.
    ///
    /// Returns `None` when `per_page` is outside `1..=MAX_PER_PAGE` or `page`
    /// is zero.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Option<Self> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
        if page == 0 || per_page == 0 || per_page > MAX_PER_PAGE {
            return None;
        }
        Some(Self { page, per_page })
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::new(None, None).unwrap();
        assert_eq!(p, Pagination::default());
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 24);
    }

    #[test]
    fn test_pagination_offset() {
        let p = Pagination::new(Some(3), Some(10)).unwrap();
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_pagination_rejects_out_of_range() {
        assert!(Pagination::new(Some(0), None).is_none());
        assert!(Pagination::new(None, Some(0)).is_none());
        assert!(Pagination::new(None, Some(101)).is_none());
        assert!(Pagination::new(None, Some(100)).is_some());
    }
}
