use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::settlement::check_amount;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuery {
    pub amount: Decimal,
    #[serde(default)]
    pub tax_registered: bool,
}

/// Quote shown at checkout before the buyer pays.
pub async fn fee_breakdown(
    State(state): State<AppState>,
    query: Result<Query<FeeQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let amount =
        check_amount(query.amount).map_err(|e| AppError::ValidationError(e.to_string()))?;

    let breakdown = state
        .finalizer
        .rates()
        .breakdown(amount, query.tax_registered);

    Ok(success(breakdown, "Fee breakdown computed"))
}
