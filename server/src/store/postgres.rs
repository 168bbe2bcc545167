use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::ticket::total_seats;
use crate::models::{BookedTicket, Booking, BookingStatus};
use crate::settlement::{commit_seats, SettlementError};
use crate::store::{
    BookingContext, ConfirmOutcome, Confirmation, SettlementBasis, SettlementStore,
};

const BOOKING_COLUMNS: &str = "id, buyer_id, event_id, booking_chart_id, amount, currency, \
     status, order_ref, payment_ref, confirmed_at, created_at, updated_at";

#[derive(FromRow)]
struct BasisRow {
    #[sqlx(flatten)]
    booking: Booking,
    vendor_tax_registered: bool,
}

#[derive(Clone)]
pub struct PgSettlementStore {
    pool: PgPool,
}

impl PgSettlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettlementStore for PgSettlementStore {
    async fn confirm_booking(
        &self,
        order_ref: &str,
        payment_ref: &str,
    ) -> Result<ConfirmOutcome, SettlementError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<(Uuid, Uuid)> =
            sqlx::query_as("SELECT buyer_id, event_id FROM bookings WHERE order_ref = $1")
                .bind(order_ref)
                .fetch_optional(&mut *tx)
                .await?;
        let (buyer_id, event_id) =
            owner.ok_or_else(|| SettlementError::BookingNotFound(order_ref.to_string()))?;

        // Lock every checkout of this buyer and event in id order. Duplicate
        // callbacks wait here, and sibling confirmations cannot deadlock on
        // each other's cleanup.
        let group_sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE buyer_id = $1 AND event_id = $2 ORDER BY id FOR UPDATE"
        );
        let group: Vec<Booking> = sqlx::query_as(&group_sql)
            .bind(buyer_id)
            .bind(event_id)
            .fetch_all(&mut *tx)
            .await?;

        // Gone if a sibling was confirmed while we waited for the lock.
        let booking = group
            .into_iter()
            .find(|b| b.order_ref == order_ref)
            .ok_or_else(|| SettlementError::BookingNotFound(order_ref.to_string()))?;

        match booking.status {
            BookingStatus::Pending => {}
            BookingStatus::Success => {
                tx.rollback().await?;
                return Ok(ConfirmOutcome::AlreadyConfirmed(booking));
            }
            from => {
                return Err(SettlementError::InvalidTransition {
                    order_ref: order_ref.to_string(),
                    from,
                })
            }
        }

        let tickets: Vec<BookedTicket> = sqlx::query_as(
            r#"
            SELECT bt.id, bt.booking_id, bt.ticket_definition_id, td.name AS ticket_name,
                   bt.quantity, bt.unit_price
            FROM booking_tickets bt
            JOIN ticket_definitions td ON td.id = bt.ticket_definition_id
            WHERE bt.booking_id = $1
            ORDER BY bt.id
            "#,
        )
        .bind(booking.id)
        .fetch_all(&mut *tx)
        .await?;

        let ledger = commit_seats(&mut *tx, booking.booking_chart_id, total_seats(&tickets)?).await?;

        let confirm_sql = format!(
            "UPDATE bookings \
             SET status = $2, payment_ref = $3, confirmed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        );
        let booking: Booking = sqlx::query_as(&confirm_sql)
            .bind(booking.id)
            .bind(BookingStatus::Success)
            .bind(payment_ref)
            .fetch_one(&mut *tx)
            .await?;

        let discarded_pending = sqlx::query(
            "DELETE FROM bookings \
             WHERE buyer_id = $1 AND event_id = $2 AND status = $3 AND id <> $4",
        )
        .bind(buyer_id)
        .bind(event_id)
        .bind(BookingStatus::Pending)
        .bind(booking.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let context: BookingContext = sqlx::query_as(
            r#"
            SELECT bu.name AS buyer_name, bu.email AS buyer_email, e.title AS event_title,
                   v.name AS vendor_name, v.is_tax_registered AS vendor_tax_registered
            FROM bookings b
            JOIN buyers bu ON bu.id = b.buyer_id
            JOIN events e ON e.id = b.event_id
            JOIN vendors v ON v.id = e.vendor_id
            WHERE b.id = $1
            "#,
        )
        .bind(booking.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ConfirmOutcome::Confirmed(Box::new(Confirmation {
            booking,
            tickets,
            ledger,
            context,
            discarded_pending,
        })))
    }

    async fn settlement_basis(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<SettlementBasis>, SettlementError> {
        let row: Option<BasisRow> = sqlx::query_as(
            r#"
            SELECT b.id, b.buyer_id, b.event_id, b.booking_chart_id, b.amount, b.currency,
                   b.status, b.order_ref, b.payment_ref, b.confirmed_at, b.created_at,
                   b.updated_at, v.is_tax_registered AS vendor_tax_registered
            FROM bookings b
            JOIN events e ON e.id = b.event_id
            JOIN vendors v ON v.id = e.vendor_id
            WHERE b.id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| SettlementBasis {
            booking: row.booking,
            vendor_tax_registered: row.vendor_tax_registered,
        }))
    }
}
