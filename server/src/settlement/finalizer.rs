//! Confirmation of pending bookings from payment gateway callbacks.
//!
//! `PENDING --[valid signature]--> SUCCESS` is the only transition this
//! module performs. Replays of an already confirmed order succeed without
//! touching the ledger again.

use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::models::ticket::total_amount;
use crate::models::Booking;
use crate::notify::{BookingReceipt, NotificationDispatcher};
use crate::settlement::{signature, FeeBreakdown, FeeRates, GatewaySecret, SettlementError};
use crate::store::{ConfirmOutcome, SettlementStore};

/// Identifiers and signature posted by the gateway once a charge succeeds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallback {
    #[serde(alias = "razorpay_order_id")]
    pub order_ref: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_ref: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

#[derive(Debug)]
pub struct FinalizeOutcome {
    pub booking: Booking,
    /// The order had been confirmed by an earlier callback.
    pub replayed: bool,
    pub breakdown: Option<FeeBreakdown>,
    /// Background confirmation send; `None` for replays.
    pub notification: Option<JoinHandle<()>>,
}

pub struct BookingFinalizer {
    store: Arc<dyn SettlementStore>,
    secret: GatewaySecret,
    rates: FeeRates,
    dispatcher: NotificationDispatcher,
}

impl BookingFinalizer {
    pub fn new(
        store: Arc<dyn SettlementStore>,
        secret: GatewaySecret,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            secret,
            rates: FeeRates::STANDARD,
            dispatcher,
        }
    }

    pub fn rates(&self) -> &FeeRates {
        &self.rates
    }

    #[tracing::instrument(
        name = "finalize_booking",
        skip(self, callback),
        fields(order_ref = %callback.order_ref, payment_ref = %callback.payment_ref)
    )]
    pub async fn finalize(
        &self,
        callback: &PaymentCallback,
    ) -> Result<FinalizeOutcome, SettlementError> {
        let authentic = signature::verify(
            &callback.order_ref,
            &callback.payment_ref,
            &callback.signature,
            self.secret.as_bytes(),
        )?;
        if !authentic {
            tracing::warn!("Payment signature mismatch");
            return Err(SettlementError::VerificationFailed);
        }

        let outcome = self
            .store
            .confirm_booking(&callback.order_ref, &callback.payment_ref)
            .await
            .inspect_err(|e| {
                if let SettlementError::CapacityExceeded {
                    entry_id,
                    capacity,
                    committed,
                    requested,
                } = e
                {
                    tracing::error!(
                        alert = "oversell",
                        %entry_id,
                        capacity,
                        committed,
                        requested,
                        "Paid booking exceeds slot capacity; left pending"
                    );
                }
            })?;

        let confirmation = match outcome {
            ConfirmOutcome::AlreadyConfirmed(booking) => {
                if booking.payment_ref.as_deref() != Some(callback.payment_ref.as_str()) {
                    tracing::warn!(
                        booking_id = %booking.id,
                        recorded_payment_ref = ?booking.payment_ref,
                        "Replay carries a different payment reference"
                    );
                }
                tracing::info!(booking_id = %booking.id, "Booking already confirmed");
                return Ok(FinalizeOutcome {
                    booking,
                    replayed: true,
                    breakdown: None,
                    notification: None,
                });
            }
            ConfirmOutcome::Confirmed(confirmation) => *confirmation,
        };

        tracing::info!(
            booking_id = %confirmation.booking.id,
            entry_id = %confirmation.ledger.entry_id,
            committed = confirmation.ledger.new_committed,
            discarded_pending = confirmation.discarded_pending,
            "Booking confirmed"
        );

        let line_total = total_amount(&confirmation.tickets);
        if line_total != confirmation.booking.amount {
            tracing::warn!(
                booking_id = %confirmation.booking.id,
                amount = %confirmation.booking.amount,
                %line_total,
                "Booking amount differs from its line items; settling on the booking amount"
            );
        }

        let breakdown = self.rates.breakdown(
            confirmation.booking.amount,
            confirmation.context.vendor_tax_registered,
        );
        let notification = self.dispatcher.dispatch(BookingReceipt {
            booking: confirmation.booking.clone(),
            context: confirmation.context,
            tickets: confirmation.tickets,
            breakdown,
        });

        Ok(FinalizeOutcome {
            booking: confirmation.booking,
            replayed: false,
            breakdown: Some(breakdown),
            notification: Some(notification),
        })
    }
}
