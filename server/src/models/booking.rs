use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Success,
    Failed,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Success => "SUCCESS",
            BookingStatus::Failed => "FAILED",
            BookingStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A buyer's claim on one inventory slot, created at checkout.
///
/// Only the booking finalizer moves a booking out of `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub event_id: Uuid,
    pub booking_chart_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: BookingStatus,
    pub order_ref: String,
    pub payment_ref: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Two bookings compete for the same confirmation when they belong to the
    /// same buyer and event.
    pub fn is_sibling_of(&self, other: &Booking) -> bool {
        self.id != other.id && self.buyer_id == other.buyer_id && self.event_id == other.event_id
    }
}
