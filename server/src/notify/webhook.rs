use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::notify::{BookingReceipt, ConfirmationDocument, Notifier, NotifyError};
use crate::settlement::FeeBreakdown;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    booking_id: String,
    order_ref: &'a str,
    document: ConfirmationDocument,
    breakdown: &'a FeeBreakdown,
}

/// Posts rendered confirmations to a mail relay.
///
/// Built once at startup; the underlying connection pool is reused for every
/// booking.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_confirmation(&self, receipt: &BookingReceipt) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            booking_id: receipt.booking.id.to_string(),
            order_ref: &receipt.booking.order_ref,
            document: ConfirmationDocument::render(receipt),
            breakdown: &receipt.breakdown,
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        tracing::debug!(endpoint = %self.endpoint, status = status.as_u16(), "Webhook accepted confirmation");
        Ok(())
    }
}
