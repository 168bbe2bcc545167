use axum::response::Response;
use serde::Serialize;

use crate::utils::response::success;

pub mod bookings;
pub mod fees;
pub mod payments;

pub use bookings::booking_settlement;
pub use fees::fee_breakdown;
pub use payments::verify_payment;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "settlement-api",
    };

    success(payload, "Health check successful")
}
