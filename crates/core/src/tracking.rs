//! Shipment tracking history and reference number formats.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ShippingStatus;

/// Prefix of every tracking number.
pub const TRACKING_PREFIX: &str = "AU";
/// Number of characters after the tracking prefix.
pub const TRACKING_SUFFIX_LEN: usize = 12;
/// Prefix of every order number.
pub const ORDER_NUMBER_PREFIX: &str = "AUR";
/// Number of random characters at the end of an order number.
pub const ORDER_SUFFIX_LEN: usize = 6;

/// One entry in a shipment's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: ShippingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl TrackingEvent {
    #[must_use]
    pub fn new(status: ShippingStatus, description: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            status,
            location: None,
            description: description.into(),
            occurred_at,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Chronologically ordered shipment history.
///
/// Stored as a JSON array on the shipping row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingHistory(Vec<TrackingEvent>);

impl TrackingHistory {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert an event, keeping events ordered by `occurred_at`.
    ///
    /// Events with equal timestamps keep insertion order.
    pub fn push(&mut self, event: TrackingEvent) {
        let idx = self
            .0
            .partition_point(|e| e.occurred_at <= event.occurred_at);
        self.0.insert(idx, event);
    }

    /// Status of the latest event, if any.
    #[must_use]
    pub fn current_status(&self) -> Option<ShippingStatus> {
        self.0.last().map(|e| e.status)
    }

    #[must_use]
    pub fn events(&self) -> &[TrackingEvent] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<TrackingEvent>> for TrackingHistory {
    fn from(mut events: Vec<TrackingEvent>) -> Self {
        events.sort_by_key(|e| e.occurred_at);
        Self(events)
    }
}

fn is_upper_alnum(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}

/// `AU` followed by 12 uppercase letters or digits.
#[must_use]
pub fn is_valid_tracking_number(s: &str) -> bool {
    s.strip_prefix(TRACKING_PREFIX)
        .is_some_and(|rest| rest.len() == TRACKING_SUFFIX_LEN && is_upper_alnum(rest))
}

/// `AUR-YYYYMMDD-` followed by 6 uppercase letters or digits.
#[must_use]
pub fn is_valid_order_number(s: &str) -> bool {
    let mut parts = s.split('-');
    let (Some(prefix), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    prefix == ORDER_NUMBER_PREFIX
        && date.len() == 8
        && NaiveDate::parse_from_str(date, "%Y%m%d").is_ok()
        && suffix.len() == ORDER_SUFFIX_LEN
        && is_upper_alnum(suffix)
}

/// Build an order number from its date and random suffix.
#[must_use]
pub fn format_order_number(date: NaiveDate, suffix: &str) -> String {
    format!("{ORDER_NUMBER_PREFIX}-{}-{suffix}", date.format("%Y%m%d"))
}
