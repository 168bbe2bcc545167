use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::models::BookingStatus;
use crate::settlement::PaymentCallback;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifiedPayment {
    booking_id: Uuid,
    order_ref: String,
    payment_ref: Option<String>,
    status: BookingStatus,
    replayed: bool,
}

/// Gateway success callback. The only path that confirms a booking.
pub async fn verify_payment(
    State(state): State<AppState>,
    payload: Result<Json<PaymentCallback>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(callback) = payload?;
    let outcome = state.finalizer.finalize(&callback).await?;

    let payload = VerifiedPayment {
        booking_id: outcome.booking.id,
        order_ref: outcome.booking.order_ref,
        payment_ref: outcome.booking.payment_ref,
        status: outcome.booking.status,
        replayed: outcome.replayed,
    };

    Ok(success(payload, "Payment verified, booking confirmed"))
}
