//! In-process store with the same confirmation semantics as Postgres.
//!
//! One async mutex guards the whole state; every fallible check runs before
//! the first mutation, so a rejected confirmation leaves nothing behind.
//!
//! The global lock serializes every confirmation, including ones for
//! unrelated orders. That is fine for tests and local runs but says nothing
//! about contention: per-group locking lives in [`super::postgres`].

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::ticket::total_seats;
use crate::models::{
    BookedTicket, Booking, BookingChartEntry, BookingStatus, Buyer, Event, Vendor,
};
use crate::settlement::{LedgerCommit, SettlementError};
use crate::store::{
    BookingContext, ConfirmOutcome, Confirmation, SettlementBasis, SettlementStore,
};

#[derive(Default)]
struct MemoryState {
    vendors: HashMap<Uuid, Vendor>,
    buyers: HashMap<Uuid, Buyer>,
    events: HashMap<Uuid, Event>,
    chart: HashMap<Uuid, BookingChartEntry>,
    bookings: HashMap<Uuid, Booking>,
    tickets: HashMap<Uuid, Vec<BookedTicket>>,
}

impl MemoryState {
    fn vendor_of(&self, booking: &Booking) -> Option<&Vendor> {
        let event = self.events.get(&booking.event_id)?;
        self.vendors.get(&event.vendor_id)
    }

    fn context_for(&self, booking: &Booking) -> Option<BookingContext> {
        let buyer = self.buyers.get(&booking.buyer_id)?;
        let event = self.events.get(&booking.event_id)?;
        let vendor = self.vendors.get(&event.vendor_id)?;

        Some(BookingContext {
            buyer_name: buyer.name.clone(),
            buyer_email: buyer.email.clone(),
            event_title: event.title.clone(),
            vendor_name: vendor.name.clone(),
            vendor_tax_registered: vendor.is_tax_registered,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_vendor(&self, vendor: Vendor) {
        self.state.lock().await.vendors.insert(vendor.id, vendor);
    }

    pub async fn insert_buyer(&self, buyer: Buyer) {
        self.state.lock().await.buyers.insert(buyer.id, buyer);
    }

    pub async fn insert_event(&self, event: Event) {
        self.state.lock().await.events.insert(event.id, event);
    }

    pub async fn insert_chart_entry(&self, entry: BookingChartEntry) {
        self.state.lock().await.chart.insert(entry.id, entry);
    }

    pub async fn insert_booking(&self, booking: Booking, tickets: Vec<BookedTicket>) {
        let mut state = self.state.lock().await;
        state.tickets.insert(booking.id, tickets);
        state.bookings.insert(booking.id, booking);
    }

    pub async fn chart_entry(&self, id: Uuid) -> Option<BookingChartEntry> {
        self.state.lock().await.chart.get(&id).cloned()
    }

    pub async fn booking_by_order(&self, order_ref: &str) -> Option<Booking> {
        self.state
            .lock()
            .await
            .bookings
            .values()
            .find(|b| b.order_ref == order_ref)
            .cloned()
    }
}

#[async_trait]
impl SettlementStore for MemoryStore {
    async fn confirm_booking(
        &self,
        order_ref: &str,
        payment_ref: &str,
    ) -> Result<ConfirmOutcome, SettlementError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let booking = state
            .bookings
            .values()
            .find(|b| b.order_ref == order_ref)
            .cloned()
            .ok_or_else(|| SettlementError::BookingNotFound(order_ref.to_string()))?;

        match booking.status {
            BookingStatus::Pending => {}
            BookingStatus::Success => return Ok(ConfirmOutcome::AlreadyConfirmed(booking)),
            from => {
                return Err(SettlementError::InvalidTransition {
                    order_ref: order_ref.to_string(),
                    from,
                })
            }
        }

        let tickets = state.tickets.get(&booking.id).cloned().unwrap_or_default();
        let context = state
            .context_for(&booking)
            .ok_or(SettlementError::BookingContextMissing(booking.id))?;
        let new_committed = state
            .chart
            .get(&booking.booking_chart_id)
            .ok_or(SettlementError::LedgerEntryNotFound(booking.booking_chart_id))?
            .admit(total_seats(&tickets)?)?;

        let now = Utc::now();
        if let Some(entry) = state.chart.get_mut(&booking.booking_chart_id) {
            entry.booked_seats = new_committed;
            entry.updated_at = now;
        }

        let mut confirmed = booking;
        confirmed.status = BookingStatus::Success;
        confirmed.payment_ref = Some(payment_ref.to_string());
        confirmed.confirmed_at = Some(now);
        confirmed.updated_at = now;
        state.bookings.insert(confirmed.id, confirmed.clone());

        let stale: Vec<Uuid> = state
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Pending && b.is_sibling_of(&confirmed))
            .map(|b| b.id)
            .collect();
        for id in &stale {
            state.bookings.remove(id);
            state.tickets.remove(id);
        }

        Ok(ConfirmOutcome::Confirmed(Box::new(Confirmation {
            ledger: LedgerCommit {
                entry_id: confirmed.booking_chart_id,
                new_committed,
            },
            booking: confirmed,
            tickets,
            context,
            discarded_pending: stale.len() as u64,
        })))
    }

    async fn settlement_basis(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<SettlementBasis>, SettlementError> {
        let state = self.state.lock().await;

        let Some(booking) = state.bookings.get(&booking_id) else {
            return Ok(None);
        };
        let vendor = state
            .vendor_of(booking)
            .ok_or(SettlementError::BookingContextMissing(booking.id))?;

        Ok(Some(SettlementBasis {
            booking: booking.clone(),
            vendor_tax_registered: vendor.is_tax_registered,
        }))
    }
}
