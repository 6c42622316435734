#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use appointment_cell::{BookingService, ConfirmBookingRequest};
use reservation_cell::ReservationService;
use shared_database::{MemoryStore, SchedulingStore};
use shared_utils::test_utils::{available_slot, hm, patient_details};
use shared_utils::ManualClock;

pub const DOCTOR_ID: &str = "doc-1";

pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// Booking and reservation services sharing one in-memory store and a
/// manually driven clock, with two slots on `monday()`.
pub struct TestBooking {
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub reservations: Arc<ReservationService>,
    pub bookings: Arc<BookingService>,
    pub slot_ids: Vec<String>,
}

impl TestBooking {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap());

        let slots = vec![
            available_slot(DOCTOR_ID, monday(), 0, hm(9, 0), hm(9, 30)),
            available_slot(DOCTOR_ID, monday(), 1, hm(9, 30), hm(10, 0)),
        ];
        store.insert_slots(&slots).await.unwrap();

        let dyn_store: Arc<dyn SchedulingStore> = store.clone();
        let reservations = Arc::new(ReservationService::new(
            dyn_store,
            Arc::new(clock.clone()),
            Duration::seconds(300),
        ));
        let bookings = Arc::new(BookingService::new(reservations.clone()));

        Self {
            store,
            clock,
            reservations,
            bookings,
            slot_ids: slots.into_iter().map(|slot| slot.id).collect(),
        }
    }

    pub fn slot(&self, index: usize) -> &str {
        &self.slot_ids[index]
    }
}

pub fn confirm_request(hold_id: &str, patient_id: &str) -> ConfirmBookingRequest {
    ConfirmBookingRequest {
        hold_id: hold_id.to_string(),
        patient_id: patient_id.to_string(),
        patient: patient_details("Jane Doe"),
        reason: "checkup".to_string(),
    }
}
