//! Aurelia storefront library.
//!
//! The JSON API server for the jewelry shop: customer and back-office
//! routes, repositories, services and middleware. The binary in `main.rs`
//! wires these together; the library form lets tests drive the router
//! directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
