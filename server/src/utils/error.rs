use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::settlement::SettlementError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Payment verification failed")]
    PaymentVerificationFailed,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::PaymentVerificationFailed => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::PaymentVerificationFailed => "PAYMENT_VERIFICATION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::PaymentVerificationFailed => {
                warn!(code = self.code(), "Payment verification failed");
            }
            AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::PaymentVerificationFailed => "Payment verification failed".to_string(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalServerError(_) => "An internal error occurred".to_string(),
        }
    }
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::MalformedCallback(msg) => AppError::ValidationError(msg),
            SettlementError::VerificationFailed => AppError::PaymentVerificationFailed,
            SettlementError::BookingNotFound(order_ref) => {
                AppError::NotFound(format!("No booking found for order '{}'", order_ref))
            }
            err @ SettlementError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            SettlementError::CapacityExceeded { .. } => {
                AppError::Conflict("The selected slot has no seats left".to_string())
            }
            err @ (SettlementError::BookingContextMissing(_)
            | SettlementError::LedgerEntryNotFound(_)
            | SettlementError::InvalidSeatDelta(_)) => AppError::InternalServerError(err.to_string()),
            SettlementError::Database(e) => AppError::DatabaseError(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Do not expose internal details in the API response
        error_response(code, self.public_message(), None, status)
    }
}
