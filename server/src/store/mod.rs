//! Persistence behind the booking finalizer.
//!
//! All contention is resolved by the store: finalizer instances share no
//! in-process state and may be scaled horizontally.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{BookedTicket, Booking};
use crate::settlement::{LedgerCommit, SettlementError};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgSettlementStore;

/// Who and what a confirmed booking is for, as needed by receipts.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookingContext {
    pub buyer_name: String,
    pub buyer_email: String,
    pub event_title: String,
    pub vendor_name: String,
    pub vendor_tax_registered: bool,
}

/// Result of a transaction that moved a booking from pending to confirmed.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub booking: Booking,
    pub tickets: Vec<BookedTicket>,
    pub ledger: LedgerCommit,
    pub context: BookingContext,
    /// Other pending checkouts of the same buyer and event that were removed.
    pub discarded_pending: u64,
}

#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    Confirmed(Box<Confirmation>),
    /// The booking was confirmed by an earlier callback; nothing was changed.
    AlreadyConfirmed(Booking),
}

/// The two inputs a fee breakdown is recomputed from.
#[derive(Debug, Clone)]
pub struct SettlementBasis {
    pub booking: Booking,
    pub vendor_tax_registered: bool,
}

#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Atomically confirms the pending booking for `order_ref`: records the
    /// payment, commits its seats on the ledger entry and removes sibling
    /// pending bookings. Either all of it happens or none of it does.
    async fn confirm_booking(
        &self,
        order_ref: &str,
        payment_ref: &str,
    ) -> Result<ConfirmOutcome, SettlementError>;

    async fn settlement_basis(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<SettlementBasis>, SettlementError>;
}
