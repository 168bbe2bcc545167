//! Seat commitments against a booking chart entry.
//!
//! The capacity check and the increment are a single conditional `UPDATE`, so
//! concurrent commits on the same entry serialize on its row lock and the
//! loser re-evaluates the ceiling against the winner's count. Other entries
//! are never touched.

use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::settlement::SettlementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCommit {
    pub entry_id: Uuid,
    pub new_committed: i32,
}

/// Adds `seat_delta` committed seats to one entry inside the caller's
/// transaction. Performs exactly one increment per call.
pub async fn commit_seats(
    conn: &mut PgConnection,
    entry_id: Uuid,
    seat_delta: i32,
) -> Result<LedgerCommit, SettlementError> {
    if seat_delta < 0 {
        return Err(SettlementError::InvalidSeatDelta(seat_delta));
    }

    let updated: Option<(i32,)> = sqlx::query_as(
        r#"
        UPDATE booking_chart
        SET booked_seats = booked_seats + $2, updated_at = NOW()
        WHERE id = $1 AND (is_subscription OR booked_seats + $2 <= capacity)
        RETURNING booked_seats
        "#,
    )
    .bind(entry_id)
    .bind(seat_delta)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((new_committed,)) = updated {
        tracing::debug!(%entry_id, seat_delta, new_committed, "Seats committed");
        return Ok(LedgerCommit {
            entry_id,
            new_committed,
        });
    }

    let current: Option<(i32, i32)> =
        sqlx::query_as("SELECT capacity, booked_seats FROM booking_chart WHERE id = $1")
            .bind(entry_id)
            .fetch_optional(&mut *conn)
            .await?;

    match current {
        Some((capacity, committed)) => Err(SettlementError::CapacityExceeded {
            entry_id,
            capacity,
            committed,
            requested: seat_delta,
        }),
        None => Err(SettlementError::LedgerEntryNotFound(entry_id)),
    }
}
