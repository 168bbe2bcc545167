use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::settlement::SettlementError;

/// Seat counter of a single bookable slot of an event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookingChartEntry {
    pub id: Uuid,
    pub event_id: Uuid,
    pub slot_start: DateTime<Utc>,
    pub slot_end: Option<DateTime<Utc>>,
    pub capacity: i32,
    pub booked_seats: i32,
    /// Subscription slots have no ceiling.
    pub is_subscription: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingChartEntry {
    /// Returns the committed count after adding `seat_delta`, or the reason it
    /// cannot be added. Does not mutate the entry.
    pub fn admit(&self, seat_delta: i32) -> Result<i32, SettlementError> {
        if seat_delta < 0 {
            return Err(SettlementError::InvalidSeatDelta(seat_delta));
        }

        let next = self
            .booked_seats
            .checked_add(seat_delta)
            .ok_or(SettlementError::InvalidSeatDelta(seat_delta))?;

        if !self.is_subscription && next > self.capacity {
            return Err(SettlementError::CapacityExceeded {
                entry_id: self.id,
                capacity: self.capacity,
                committed: self.booked_seats,
                requested: seat_delta,
            });
        }

        Ok(next)
    }
}
