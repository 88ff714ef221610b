//! Order Model

use super::serde_helpers::double_option;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const ORDER_NUMBER_PREFIX: &str = "ORD-";

/// Human-readable order number `ORD-<n>`
///
/// `n` is a positive decimal integer without sign or leading zeros.
/// Ordering is numeric, so `ORD-9 < ORD-10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderNumber(i64);

impl OrderNumber {
    /// Wrap a sequence value, rejecting non-positive values
    pub fn new(value: i64) -> Option<Self> {
        (value >= 1).then_some(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Error returned when a string is not a valid order number
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order number: {0:?}")]
pub struct InvalidOrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = InvalidOrderNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidOrderNumber(s.to_string());
        let digits = s.strip_prefix(ORDER_NUMBER_PREFIX).ok_or_else(invalid)?;

        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        digits
            .parse::<i64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ORDER_NUMBER_PREFIX, self.0)
    }
}

impl Serialize for OrderNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    InProgress,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 2] = [OrderStatus::InProgress, OrderStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognised status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status: {0:?}")]
pub struct InvalidOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidOrderStatus(s.to_string()))
    }
}

/// Price snapshot of one ordered item occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
}

/// Immutable item snapshot stored with the order
///
/// `item_ids` is the request as submitted. `item_details` has one entry per
/// resolved occurrence in request order, so the order total is always the
/// sum of `item_details[].price`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderItems {
    pub item_ids: Vec<i64>,
    pub item_details: Vec<OrderItemSnapshot>,
}

impl OrderItems {
    pub fn total(&self) -> Decimal {
        self.item_details.iter().map(|d| d.price).sum()
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_number: OrderNumber,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: OrderItems,
    pub status: OrderStatus,
    pub star_rating: Option<i16>,
    pub feedback: Option<String>,
}

/// Validated change set for the mutable order fields
///
/// `None` leaves a field unchanged. For the optional fields `Some(None)`
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub star_rating: Option<Option<i16>>,
    pub feedback: Option<Option<String>>,
}

impl OrderChanges {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.star_rating.is_none() && self.feedback.is_none()
    }

    /// Apply the change set to an order in place
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(star_rating) = self.star_rating {
            order.star_rating = star_rating;
        }
        if let Some(feedback) = &self.feedback {
            order.feedback = feedback.clone();
        }
    }
}

// ==================== Request / response payloads ====================

/// Create order request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCreate {
    #[serde(default)]
    pub items: Vec<i64>,
}

/// Create order response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_number: OrderNumber,
    pub total_price: Decimal,
}

/// Status update request (value validated by the service)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

/// Status update response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdated {
    pub order_number: OrderNumber,
    pub status: OrderStatus,
}

/// Feedback submission request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSubmit {
    pub order_number: Option<String>,
    pub star_rating: Option<i64>,
    pub feedback: Option<String>,
}

/// Feedback submission response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSubmitted {
    pub order_number: OrderNumber,
    pub star_rating: i16,
    pub feedback: Option<String>,
}

/// Full replacement of the mutable order fields (PUT)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReplace {
    pub status: Option<String>,
    pub star_rating: Option<i64>,
    pub feedback: Option<String>,
}

/// Partial update of the mutable order fields (PATCH)
///
/// An explicit `null` clears `star_rating` or `feedback`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub star_rating: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub feedback: Option<Option<String>>,
}

/// Average rating response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AverageRating {
    pub average_rating: Option<f64>,
}
