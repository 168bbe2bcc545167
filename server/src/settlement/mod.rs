pub mod error;
pub mod fees;
pub mod finalizer;
pub mod ledger;
pub mod signature;

pub use error::SettlementError;
pub use fees::{check_amount, compute_breakdown, AmountError, FeeBreakdown, FeeRates, MAX_AMOUNT};
pub use finalizer::{BookingFinalizer, FinalizeOutcome, PaymentCallback};
pub use ledger::{commit_seats, LedgerCommit};
pub use signature::{GatewaySecret, SignatureError};
