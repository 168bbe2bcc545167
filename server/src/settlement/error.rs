use thiserror::Error;
use uuid::Uuid;

use crate::models::BookingStatus;
use crate::settlement::signature::SignatureError;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Malformed payment callback: {0}")]
    MalformedCallback(String),

    #[error("Payment verification failed")]
    VerificationFailed,

    #[error("No booking for order {0}")]
    BookingNotFound(String),

    #[error("Booking for order {order_ref} is {from} and cannot be confirmed")]
    InvalidTransition {
        order_ref: String,
        from: BookingStatus,
    },

    #[error("Buyer, event or vendor of booking {0} is missing")]
    BookingContextMissing(Uuid),

    #[error("Ledger entry {0} not found")]
    LedgerEntryNotFound(Uuid),

    #[error(
        "Ledger entry {entry_id} is full: {committed} of {capacity} seats committed, {requested} requested"
    )]
    CapacityExceeded {
        entry_id: Uuid,
        capacity: i32,
        committed: i32,
        requested: i32,
    },

    #[error("Invalid seat delta {0}")]
    InvalidSeatDelta(i32),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl From<SignatureError> for SettlementError {
    fn from(err: SignatureError) -> Self {
        SettlementError::MalformedCallback(err.to_string())
    }
}
