//! Back-office routes under `/api/admin`.
//!
//! Every handler takes one of the admin extractors: reads need any admin
//! session, writes need the `admin` or `super_admin` role, and managing
//! admin accounts needs `super_admin`.

pub mod auth;
pub mod catalog;
pub mod contact;
pub mod inventory;
pub mod orders;
pub mod users;
