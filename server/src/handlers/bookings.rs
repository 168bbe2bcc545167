use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::models::BookingStatus;
use crate::settlement::FeeBreakdown;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingSettlement {
    booking_id: Uuid,
    order_ref: String,
    currency: String,
    vendor_tax_registered: bool,
    breakdown: FeeBreakdown,
}

/// Fee split of a confirmed booking, recomputed from its stored amount.
pub async fn booking_settlement(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let basis = state
        .store
        .settlement_basis(booking_id)
        .await?
        .filter(|basis| basis.booking.status == BookingStatus::Success)
        .ok_or_else(|| {
            AppError::NotFound(format!("No confirmed booking with id '{}'", booking_id))
        })?;

    let breakdown = state
        .finalizer
        .rates()
        .breakdown(basis.booking.amount, basis.vendor_tax_registered);

    let payload = BookingSettlement {
        booking_id: basis.booking.id,
        order_ref: basis.booking.order_ref,
        currency: basis.booking.currency,
        vendor_tax_registered: basis.vendor_tax_registered,
        breakdown,
    };

    Ok(success(payload, "Settlement computed"))
}
