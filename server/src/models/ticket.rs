use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::settlement::SettlementError;

/// One line of a booking: a catalog ticket and how many of it, with the
/// name and unit price as they were at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookedTicket {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub ticket_definition_id: Uuid,
    pub ticket_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl BookedTicket {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Seats a booking consumes on its ledger entry.
pub fn total_seats(tickets: &[BookedTicket]) -> Result<i32, SettlementError> {
    tickets.iter().try_fold(0i32, |total, t| {
        total
            .checked_add(t.quantity)
            .ok_or(SettlementError::InvalidSeatDelta(t.quantity))
    })
}

pub fn total_amount(tickets: &[BookedTicket]) -> Decimal {
    tickets.iter().map(BookedTicket::line_total).sum()
}
