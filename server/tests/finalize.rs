//! Booking finalizer behaviour against the in-memory store.
//!
//! Run with: `cargo test --test finalize`

mod common;

use rust_decimal_macros::dec;
use std::sync::Arc;

use common::{signed_callback, Fixture, RecordingNotifier};
use settlement_server::models::BookingStatus;
use settlement_server::settlement::{PaymentCallback, SettlementError};

#[tokio::test]
async fn test_valid_callback_confirms_booking() {
    let fx = Fixture::new(10).await;
    let buyer = fx.buyer().await;
    let booking = fx.pending_booking(buyer, 2).await;
    let finalizer = fx.finalizer();

    let outcome = finalizer
        .finalize(&signed_callback(&booking.order_ref, "pay_001"))
        .await
        .unwrap();

    assert!(!outcome.replayed);
    assert_eq!(outcome.booking.id, booking.id);
    assert_eq!(outcome.booking.status, BookingStatus::Success);
    assert_eq!(outcome.booking.payment_ref.as_deref(), Some("pay_001"));
    assert!(outcome.booking.confirmed_at.is_some());
    assert_eq!(fx.committed().await, 2);

    let breakdown = outcome.breakdown.unwrap();
    assert_eq!(breakdown.amount, dec!(1000.00));
    assert_eq!(breakdown.amount_with_tax, dec!(1239.00));
    assert_eq!(breakdown.net_payable_to_vendor, dec!(935.00));

    outcome.notification.unwrap().await.unwrap();
    let receipts = fx.notifier.receipts.lock().unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].booking.id, booking.id);
    assert_eq!(receipts[0].breakdown, breakdown);
    assert_eq!(receipts[0].context.event_title, "Sunday Badminton Doubles");
}

#[tokio::test]
async fn test_registered_vendor_payout() {
    let fx = Fixture::tax_registered(10).await;
    let buyer = fx.buyer().await;
    let booking = fx.pending_booking(buyer, 2).await;

    let outcome = fx
        .finalizer()
        .finalize(&signed_callback(&booking.order_ref, "pay_001"))
        .await
        .unwrap();

    let breakdown = outcome.breakdown.unwrap();
    assert_eq!(breakdown.amount_payable_to_vendor, dec!(1180.00));
    assert_eq!(breakdown.net_payable, dec!(1174.00));
    assert_eq!(breakdown.net_payable_to_vendor, dec!(1115.00));
}

#[tokio::test]
async fn test_replayed_callback_commits_seats_once() {
    let fx = Fixture::new(10).await;
    let buyer = fx.buyer().await;
    let booking = fx.pending_booking(buyer, 3).await;
    let finalizer = fx.finalizer();
    let callback = signed_callback(&booking.order_ref, "pay_001");

    let first = finalizer.finalize(&callback).await.unwrap();
    first.notification.unwrap().await.unwrap();
    let second = finalizer.finalize(&callback).await.unwrap();

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(second.booking.status, BookingStatus::Success);
    assert!(second.notification.is_none());
    assert_eq!(fx.committed().await, 3);
    assert_eq!(fx.notifier.count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_callbacks_commit_once() {
    let fx = Fixture::new(10).await;
    let buyer = fx.buyer().await;
    let booking = fx.pending_booking(buyer, 2).await;
    let finalizer = Arc::new(fx.finalizer());
    let callback = signed_callback(&booking.order_ref, "pay_001");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let finalizer = Arc::clone(&finalizer);
            let callback = callback.clone();
            tokio::spawn(async move { finalizer.finalize(&callback).await })
        })
        .collect();

    let mut fresh = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if !outcome.replayed {
            fresh += 1;
        }
    }

    assert_eq!(fresh, 1);
    assert_eq!(fx.committed().await, 2);
}

#[tokio::test]
async fn test_bad_signature_changes_nothing() {
    let fx = Fixture::new(10).await;
    let buyer = fx.buyer().await;
    let booking = fx.pending_booking(buyer, 2).await;
    let finalizer = fx.finalizer();

    let mut callback = signed_callback(&booking.order_ref, "pay_001");
    let flipped = if callback.signature.starts_with('0') { "1" } else { "0" };
    callback.signature.replace_range(0..1, flipped);

    let err = finalizer.finalize(&callback).await.unwrap_err();

    assert!(matches!(err, SettlementError::VerificationFailed));
    assert_eq!(fx.status_of(&booking.order_ref).await, Some(BookingStatus::Pending));
    assert_eq!(fx.committed().await, 0);
    assert_eq!(fx.notifier.count(), 0);
}

#[tokio::test]
async fn test_signature_for_other_payment_is_rejected() {
    let fx = Fixture::new(10).await;
    let buyer = fx.buyer().await;
    let booking = fx.pending_booking(buyer, 1).await;

    let mut callback = signed_callback(&booking.order_ref, "pay_001");
    callback.payment_ref = "pay_002".to_string();

    let err = fx.finalizer().finalize(&callback).await.unwrap_err();
    assert!(matches!(err, SettlementError::VerificationFailed));
}

#[tokio::test]
async fn test_missing_signature_is_malformed() {
    let fx = Fixture::new(10).await;
    let callback = PaymentCallback {
        order_ref: "order_1".to_string(),
        payment_ref: "pay_1".to_string(),
        signature: String::new(),
    };

    let err = fx.finalizer().finalize(&callback).await.unwrap_err();
    assert!(matches!(err, SettlementError::MalformedCallback(_)));
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let fx = Fixture::new(10).await;

    let err = fx
        .finalizer()
        .finalize(&signed_callback("order_missing", "pay_001"))
        .await
        .unwrap_err();

    assert!(matches!(err, SettlementError::BookingNotFound(ref order) if order == "order_missing"));
    assert_eq!(fx.committed().await, 0);
}

#[tokio::test]
async fn test_booking_of_unknown_buyer_is_left_untouched() {
    let fx = Fixture::new(10).await;
    let booking = fx.pending_booking(uuid::Uuid::new_v4(), 2).await;

    let err = fx
        .finalizer()
        .finalize(&signed_callback(&booking.order_ref, "pay_001"))
        .await
        .unwrap_err();

    assert!(matches!(err, SettlementError::BookingContextMissing(id) if id == booking.id));
    assert_eq!(fx.committed().await, 0);
    assert_eq!(fx.status_of(&booking.order_ref).await, Some(BookingStatus::Pending));
}

#[tokio::test]
async fn test_over_capacity_leaves_booking_pending() {
    let fx = Fixture::new(3).await;
    let buyer = fx.buyer().await;
    let booking = fx.pending_booking(buyer, 4).await;

    let err = fx
        .finalizer()
        .finalize(&signed_callback(&booking.order_ref, "pay_001"))
        .await
        .unwrap_err();

    match err {
        SettlementError::CapacityExceeded {
            capacity,
            committed,
            requested,
            ..
        } => assert_eq!((capacity, committed, requested), (3, 0, 4)),
        other => panic!("expected capacity error, got {:?}", other),
    }
    assert_eq!(fx.status_of(&booking.order_ref).await, Some(BookingStatus::Pending));
    assert_eq!(fx.committed().await, 0);
    assert_eq!(fx.notifier.count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_confirmations_never_oversell() {
    const CAPACITY: i32 = 5;
    const BUYERS: usize = 24;

    let fx = Fixture::new(CAPACITY).await;
    let mut callbacks = Vec::new();
    for i in 0..BUYERS {
        let buyer = fx.buyer().await;
        let booking = fx.pending_booking(buyer, 1).await;
        callbacks.push(signed_callback(&booking.order_ref, &format!("pay_{:03}", i)));
    }
    let finalizer = Arc::new(fx.finalizer());

    let handles: Vec<_> = callbacks
        .into_iter()
        .map(|callback| {
            let finalizer = Arc::clone(&finalizer);
            tokio::spawn(async move { finalizer.finalize(&callback).await })
        })
        .collect();

    let mut confirmed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(SettlementError::CapacityExceeded { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(confirmed, CAPACITY as usize);
    assert_eq!(rejected, BUYERS - CAPACITY as usize);
    assert_eq!(fx.committed().await, CAPACITY);
}

#[tokio::test]
async fn test_subscription_slot_has_no_ceiling() {
    let fx = Fixture::subscription().await;
    let finalizer = fx.finalizer();

    for i in 0..3 {
        let buyer = fx.buyer().await;
        let booking = fx.pending_booking(buyer, 4).await;
        finalizer
            .finalize(&signed_callback(&booking.order_ref, &format!("pay_{}", i)))
            .await
            .unwrap();
    }

    assert_eq!(fx.committed().await, 12);
}

#[tokio::test]
async fn test_confirmation_discards_abandoned_checkouts() {
    let fx = Fixture::new(10).await;
    let buyer = fx.buyer().await;
    let abandoned = fx.pending_booking(buyer, 1).await;
    let retried = fx.pending_booking(buyer, 1).await;
    let paid = fx.pending_booking(buyer, 1).await;
    let other_buyer = fx.buyer().await;
    let unrelated = fx.pending_booking(other_buyer, 1).await;
    let finalizer = fx.finalizer();

    finalizer
        .finalize(&signed_callback(&paid.order_ref, "pay_001"))
        .await
        .unwrap();

    assert_eq!(fx.status_of(&paid.order_ref).await, Some(BookingStatus::Success));
    assert_eq!(fx.status_of(&abandoned.order_ref).await, None);
    assert_eq!(fx.status_of(&retried.order_ref).await, None);
    assert_eq!(fx.status_of(&unrelated.order_ref).await, Some(BookingStatus::Pending));

    let err = finalizer
        .finalize(&signed_callback(&abandoned.order_ref, "pay_002"))
        .await
        .unwrap_err();
    assert!(matches!(err, SettlementError::BookingNotFound(_)));
    assert_eq!(fx.committed().await, 1);
}

#[tokio::test]
async fn test_failed_booking_cannot_be_confirmed() {
    let fx = Fixture::new(10).await;
    let buyer = fx.buyer().await;
    let booking = fx
        .booking_with_status(buyer, 1, BookingStatus::Failed)
        .await;

    let err = fx
        .finalizer()
        .finalize(&signed_callback(&booking.order_ref, "pay_001"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SettlementError::InvalidTransition {
            from: BookingStatus::Failed,
            ..
        }
    ));
    assert_eq!(fx.committed().await, 0);
}

#[tokio::test]
async fn test_notification_failure_does_not_undo_confirmation() {
    let fx = Fixture::with_notifier(10, RecordingNotifier::failing()).await;
    let buyer = fx.buyer().await;
    let booking = fx.pending_booking(buyer, 2).await;

    let outcome = fx
        .finalizer()
        .finalize(&signed_callback(&booking.order_ref, "pay_001"))
        .await
        .unwrap();
    outcome.notification.unwrap().await.unwrap();

    assert_eq!(fx.notifier.count(), 1);
    assert_eq!(fx.status_of(&booking.order_ref).await, Some(BookingStatus::Success));
    assert_eq!(fx.committed().await, 2);
}
