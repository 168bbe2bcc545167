//! Confirmation notifications sent after a booking is settled.
//!
//! Delivery is best effort: the dispatcher runs each send on its own task
//! under a timeout and only logs the outcome.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::models::{BookedTicket, Booking};
use crate::settlement::FeeBreakdown;
use crate::store::BookingContext;

pub mod render;
pub mod webhook;

pub use render::ConfirmationDocument;
pub use webhook::WebhookNotifier;

/// Everything a confirmation message is rendered from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub booking: Booking,
    pub context: BookingContext,
    pub tickets: Vec<BookedTicket>,
    pub breakdown: FeeBreakdown,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notification endpoint rejected the message with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_confirmation(&self, receipt: &BookingReceipt) -> Result<(), NotifyError>;
}

/// Writes the rendered confirmation to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_confirmation(&self, receipt: &BookingReceipt) -> Result<(), NotifyError> {
        let document = ConfirmationDocument::render(receipt);
        tracing::info!(
            to = %document.to,
            subject = %document.subject,
            body = %document.body,
            "Booking confirmation (log only)"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    /// Sends the confirmation in the background. The returned handle resolves
    /// once the attempt finished, failed or timed out; it never carries an
    /// error.
    pub fn dispatch(&self, receipt: BookingReceipt) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.timeout;
        let span = tracing::info_span!(
            "notify_confirmation",
            booking_id = %receipt.booking.id,
            order_ref = %receipt.booking.order_ref
        );

        tokio::spawn(
            async move {
                match tokio::time::timeout(timeout, notifier.send_confirmation(&receipt)).await {
                    Ok(Ok(())) => tracing::info!("Confirmation sent"),
                    Ok(Err(e)) => tracing::error!(error = %e, "Confirmation could not be sent"),
                    Err(_) => tracing::warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "Confirmation timed out"
                    ),
                }
            }
            .instrument(span),
        )
    }
}
