//! Business logic services for the storefront.
//!
//! - `auth` - Password authentication for customers and admins
//! - `checkout` - Turning a cart into an order
//! - `numbers` - Order and tracking number generation
//! - `storage` - Object storage uploads for order message images

pub mod auth;
pub mod checkout;
pub mod numbers;
pub mod storage;
