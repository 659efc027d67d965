//! Aurelia Core - Shared domain types and rules.
//!
//! Used by every Aurelia component:
//! - `storefront` - JSON API for customers and the admin back office
//! - `cli` - Command-line tools for migrations, admin accounts and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. The optional `postgres` feature adds
//! sqlx encoding for the newtypes so repositories can bind them directly.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, handles, money and status enums
//! - [`pricing`] - Unit prices, shipping policy and order totals
//! - [`cart`] - Cart line quantity arithmetic
//! - [`inventory`] - Stock levels and low-stock checks
//! - [`tracking`] - Shipment history and reference number formats

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod inventory;
pub mod pricing;
pub mod tracking;
pub mod types;

pub use types::*;
