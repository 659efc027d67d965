//! Public order and tracking number generation.

use chrono::NaiveDate;
use rand::seq::IndexedRandom;

use aurelia_core::tracking::{
    ORDER_SUFFIX_LEN, TRACKING_PREFIX, TRACKING_SUFFIX_LEN, format_order_number,
};

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random uppercase alphanumeric string.
fn random_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.choose(&mut rng).copied().map(char::from))
        .collect()
}

/// New order number for the given day, e.g. `AUR-20260314-7KQ2ZD`.
#[must_use]
pub fn order_number(date: NaiveDate) -> String {
    format_order_number(date, &random_code(ORDER_SUFFIX_LEN))
}

/// New tracking number, e.g. `AU3FJ9K2LQ8XZP`.
#[must_use]
pub fn tracking_number() -> String {
    format!("{TRACKING_PREFIX}{}", random_code(TRACKING_SUFFIX_LEN))
}
