#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use settlement_server::models::{
    BookedTicket, Booking, BookingChartEntry, BookingStatus, Buyer, Event, Vendor,
};
use settlement_server::notify::{BookingReceipt, NotificationDispatcher, Notifier, NotifyError};
use settlement_server::settlement::{signature, BookingFinalizer, GatewaySecret, PaymentCallback};
use settlement_server::store::{MemoryStore, SettlementStore};

pub const SECRET: &[u8] = b"integration_secret";
pub const SEAT_PRICE: Decimal = dec!(500.00);

/// Captures every receipt handed to it; optionally fails each send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub receipts: Mutex<Vec<BookingReceipt>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            receipts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.receipts.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_confirmation(&self, receipt: &BookingReceipt) -> Result<(), NotifyError> {
        self.receipts.lock().unwrap().push(receipt.clone());
        if self.fail {
            Err(NotifyError::Rejected(502))
        } else {
            Ok(())
        }
    }
}

/// One vendor, one event, one slot, backed by the in-memory store.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub event_id: Uuid,
    pub chart_id: Uuid,
}

impl Fixture {
    pub async fn new(capacity: i32) -> Self {
        Self::build(capacity, false, false, RecordingNotifier::default()).await
    }

    pub async fn tax_registered(capacity: i32) -> Self {
        Self::build(capacity, true, false, RecordingNotifier::default()).await
    }

    pub async fn subscription() -> Self {
        Self::build(0, false, true, RecordingNotifier::default()).await
    }

    pub async fn with_notifier(capacity: i32, notifier: RecordingNotifier) -> Self {
        Self::build(capacity, false, false, notifier).await
    }

    async fn build(
        capacity: i32,
        is_tax_registered: bool,
        is_subscription: bool,
        notifier: RecordingNotifier,
    ) -> Self {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::new());

        let vendor_id = Uuid::new_v4();
        store
            .insert_vendor(Vendor {
                id: vendor_id,
                name: "Smash Arena".to_string(),
                contact_email: "hello@smasharena.example".to_string(),
                is_tax_registered,
                created_at: now,
                updated_at: now,
            })
            .await;

        let event_id = Uuid::new_v4();
        store
            .insert_event(Event {
                id: event_id,
                vendor_id,
                title: "Sunday Badminton Doubles".to_string(),
                description: None,
                location: "Court 3".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await;

        let chart_id = Uuid::new_v4();
        store
            .insert_chart_entry(BookingChartEntry {
                id: chart_id,
                event_id,
                slot_start: now,
                slot_end: None,
                capacity,
                booked_seats: 0,
                is_subscription,
                created_at: now,
                updated_at: now,
            })
            .await;

        Self {
            store,
            notifier: Arc::new(notifier),
            event_id,
            chart_id,
        }
    }

    pub async fn buyer(&self) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.store
            .insert_buyer(Buyer {
                id,
                name: "Asha Rao".to_string(),
                email: format!("{}@buyers.example", id.simple()),
                phone: None,
                created_at: now,
                updated_at: now,
            })
            .await;
        id
    }

    pub async fn pending_booking(&self, buyer_id: Uuid, seats: i32) -> Booking {
        self.booking_with_status(buyer_id, seats, BookingStatus::Pending)
            .await
    }

    pub async fn booking_with_status(
        &self,
        buyer_id: Uuid,
        seats: i32,
        status: BookingStatus,
    ) -> Booking {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let booking = Booking {
            id,
            buyer_id,
            event_id: self.event_id,
            booking_chart_id: self.chart_id,
            amount: SEAT_PRICE * Decimal::from(seats),
            currency: "INR".to_string(),
            status,
            order_ref: format!("order_{}", id.simple()),
            payment_ref: None,
            confirmed_at: None,
            created_at: now,
            updated_at: now,
        };
        let tickets = vec![BookedTicket {
            id: Uuid::new_v4(),
            booking_id: id,
            ticket_definition_id: Uuid::new_v4(),
            ticket_name: "Court slot".to_string(),
            quantity: seats,
            unit_price: SEAT_PRICE,
        }];

        self.store.insert_booking(booking.clone(), tickets).await;
        booking
    }

    pub fn finalizer(&self) -> BookingFinalizer {
        let store: Arc<dyn SettlementStore> = self.store.clone();
        BookingFinalizer::new(
            store,
            GatewaySecret::new(SECRET),
            NotificationDispatcher::new(self.notifier.clone(), Duration::from_secs(5)),
        )
    }

    pub async fn committed(&self) -> i32 {
        self.store
            .chart_entry(self.chart_id)
            .await
            .map(|entry| entry.booked_seats)
            .unwrap_or_default()
    }

    pub async fn status_of(&self, order_ref: &str) -> Option<BookingStatus> {
        self.store
            .booking_by_order(order_ref)
            .await
            .map(|booking| booking.status)
    }
}

pub fn signed_callback(order_ref: &str, payment_ref: &str) -> PaymentCallback {
    PaymentCallback {
        order_ref: order_ref.to_string(),
        payment_ref: payment_ref.to_string(),
        signature: signature::sign(order_ref, payment_ref, SECRET).unwrap(),
    }
}
