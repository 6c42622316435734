mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use futures::future::join_all;

use appointment_cell::AppointmentError;
use reservation_cell::ReservationError;
use shared_database::SchedulingStore;
use shared_models::{AppointmentStatus, SlotStatus};
use shared_utils::Clock;

use common::{confirm_request, monday, TestBooking};

#[tokio::test]
async fn test_confirm_books_the_slot() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();

    let appointment = t
        .bookings
        .confirm(&confirm_request(&hold.id, "patient-a"))
        .await
        .unwrap();

    assert_eq!(appointment.slot_id, t.slot(0));
    assert_eq!(appointment.patient_id, "patient-a");
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.reason, "checkup");
    assert_eq!((appointment.date, appointment.start_time), (hold.date, hold.start_time));

    let slot = t.store.get_slot(t.slot(0)).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Booked);
    assert!(slot.is_consistent());
    assert_eq!(t.store.hold_count().await, 0);

    let patient = t.store.get_patient("patient-a").await.unwrap().unwrap();
    assert_eq!(patient.email, "jane.doe@example.com");

    assert_matches!(
        t.reservations.acquire_hold(t.slot(0), "patient-b").await,
        Err(ReservationError::SlotUnavailable(_))
    );
}

#[tokio::test]
async fn test_confirm_after_expiry_fails_and_next_holder_wins() {
    let t = TestBooking::new().await;
    let hold_a = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();

    t.clock.advance_seconds(301);

    let hold_b = t.reservations.acquire_hold(t.slot(0), "patient-b").await.unwrap();
    assert_eq!(hold_b.holder_id, "patient-b");

    assert_matches!(
        t.bookings.confirm(&confirm_request(&hold_a.id, "patient-a")).await,
        Err(AppointmentError::HoldInvalidOrExpired)
    );
    assert_eq!(t.store.appointment_count().await, 0);

    let slot = t.store.get_slot(t.slot(0)).await.unwrap().unwrap();
    assert_eq!(slot.held_by.as_deref(), Some("patient-b"));
}

#[tokio::test]
async fn test_confirm_exactly_at_expiry_fails() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();

    t.clock.advance_seconds(300);

    assert_matches!(
        t.bookings.confirm(&confirm_request(&hold.id, "patient-a")).await,
        Err(AppointmentError::HoldInvalidOrExpired)
    );

    let slot = t.store.get_slot(t.slot(0)).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Available);
    assert_eq!(t.store.hold_count().await, 0);
}

#[tokio::test]
async fn test_confirm_with_wrong_holder_commits_nothing() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();

    assert_matches!(
        t.bookings.confirm(&confirm_request(&hold.id, "patient-b")).await,
        Err(AppointmentError::HoldInvalidOrExpired)
    );
    assert_matches!(
        t.bookings.confirm(&confirm_request("hold-missing", "patient-a")).await,
        Err(AppointmentError::HoldInvalidOrExpired)
    );

    let slot = t.store.get_slot(t.slot(0)).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Held);
    assert_eq!(t.store.appointment_count().await, 0);
    assert!(t.store.get_patient("patient-b").await.unwrap().is_none());
}

#[tokio::test]
async fn test_confirm_rejects_bad_details_before_touching_the_hold() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();

    let mut request = confirm_request(&hold.id, "patient-a");
    request.patient.email = "nope".to_string();

    assert_matches!(
        t.bookings.confirm(&request).await,
        Err(AppointmentError::ValidationError(_))
    );
    assert!(t.store.get_hold(&hold.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_confirm_accepts_parenthesised_area_code() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();

    let mut request = confirm_request(&hold.id, "patient-a");
    request.patient.phone = "(555) 123-4567".to_string();

    let appointment = t.bookings.confirm(&request).await.unwrap();
    assert_eq!(appointment.slot_id, t.slot(0));
}

#[tokio::test]
async fn test_confirm_fails_when_slot_left_the_hold() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();

    // The hold record is still live, but the slot no longer belongs to it.
    t.store
        .transition_slot(&hold.slot_id, &hold.release_transition(), t.clock.now())
        .await
        .unwrap()
        .unwrap();
    assert!(t.store.get_hold(&hold.id).await.unwrap().is_some());

    assert_matches!(
        t.bookings.confirm(&confirm_request(&hold.id, "patient-a")).await,
        Err(AppointmentError::HoldInvalidOrExpired)
    );

    assert_eq!(t.store.appointment_count().await, 0);
    let slot = t.store.get_slot(t.slot(0)).await.unwrap().unwrap();
    assert_ne!(slot.status, SlotStatus::Booked);
    assert!(t.store.get_patient("patient-a").await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_confirm_of_same_hold_fails() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();
    let request = confirm_request(&hold.id, "patient-a");

    t.bookings.confirm(&request).await.unwrap();

    assert_matches!(
        t.bookings.confirm(&request).await,
        Err(AppointmentError::HoldInvalidOrExpired)
    );
    assert_eq!(t.store.appointment_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_confirms_book_once() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();

    let attempts = (0..16).map(|_| {
        let bookings = Arc::clone(&t.bookings);
        let request = confirm_request(&hold.id, "patient-a");
        tokio::spawn(async move { bookings.confirm(&request).await })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|e| matches!(e, AppointmentError::HoldInvalidOrExpired)));
    assert_eq!(t.store.appointment_count().await, 1);
}

#[tokio::test]
async fn test_cancel_reopens_the_slot() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();
    let appointment = t.bookings.confirm(&confirm_request(&hold.id, "patient-a")).await.unwrap();

    let cancelled = t.bookings.cancel(&appointment.id, "patient-a").await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let slot = t.store.get_slot(t.slot(0)).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Available);
    assert!(slot.is_consistent());

    t.reservations.acquire_hold(t.slot(0), "patient-b").await.unwrap();
}

#[tokio::test]
async fn test_cancel_checks_owner_and_status() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();
    let appointment = t.bookings.confirm(&confirm_request(&hold.id, "patient-a")).await.unwrap();

    assert_matches!(
        t.bookings.cancel("apt-missing", "patient-a").await,
        Err(AppointmentError::NotFound)
    );
    assert_matches!(
        t.bookings.cancel(&appointment.id, "patient-b").await,
        Err(AppointmentError::Forbidden)
    );

    t.bookings.complete(&appointment.id).await.unwrap();
    assert_matches!(
        t.bookings.cancel(&appointment.id, "patient-a").await,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Cancelled,
        })
    );

    let slot = t.store.get_slot(t.slot(0)).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Booked);
}

#[tokio::test]
async fn test_cancel_twice_is_a_conflict() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();
    let appointment = t.bookings.confirm(&confirm_request(&hold.id, "patient-a")).await.unwrap();

    t.bookings.cancel(&appointment.id, "patient-a").await.unwrap();
    assert_matches!(
        t.bookings.cancel(&appointment.id, "patient-a").await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
}

#[tokio::test]
async fn test_no_show_is_terminal_and_keeps_slot_booked() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();
    let appointment = t.bookings.confirm(&confirm_request(&hold.id, "patient-a")).await.unwrap();

    let missed = t.bookings.mark_no_show(&appointment.id).await.unwrap();
    assert_eq!(missed.status, AppointmentStatus::NoShow);

    assert_matches!(
        t.bookings.complete(&appointment.id).await,
        Err(AppointmentError::InvalidStatusTransition { .. })
    );
    assert_matches!(
        t.bookings.update_status(&appointment.id, AppointmentStatus::Cancelled).await,
        Err(AppointmentError::ValidationError(_))
    );

    let slot = t.store.get_slot(t.slot(0)).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Booked);
}

#[tokio::test]
async fn test_list_for_patient_is_chronological() {
    let t = TestBooking::new().await;
    for slot_id in [t.slot(1), t.slot(0)] {
        let hold = t.reservations.acquire_hold(slot_id, "patient-a").await.unwrap();
        t.bookings.confirm(&confirm_request(&hold.id, "patient-a")).await.unwrap();
    }

    let appointments = t.bookings.list_for_patient("patient-a").await.unwrap();
    assert_eq!(appointments.len(), 2);
    assert_eq!(appointments[0].slot_id, t.slot(0));
    assert_eq!(appointments[1].slot_id, t.slot(1));
    assert!(appointments.iter().all(|appointment| appointment.date == monday()));

    assert!(t.bookings.list_for_patient("patient-z").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_calendar_event_reference() {
    let t = TestBooking::new().await;
    let hold = t.reservations.acquire_hold(t.slot(0), "patient-a").await.unwrap();
    let appointment = t.bookings.confirm(&confirm_request(&hold.id, "patient-a")).await.unwrap();

    let tagged = t.bookings.set_calendar_event(&appointment.id, "evt-42").await.unwrap();
    assert_eq!(tagged.calendar_event_id.as_deref(), Some("evt-42"));

    assert_matches!(
        t.bookings.set_calendar_event(&appointment.id, " ").await,
        Err(AppointmentError::ValidationError(_))
    );
    assert_matches!(
        t.bookings.set_calendar_event("apt-missing", "evt-1").await,
        Err(AppointmentError::NotFound)
    );
}
