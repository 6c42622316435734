#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use reservation_cell::ReservationService;
use shared_database::{MemoryStore, SchedulingStore};
use shared_utils::test_utils::{available_slot, hm};
use shared_utils::{Clock, ManualClock};

pub const DOCTOR_ID: &str = "doc-1";

pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// Reservation service over an in-memory store with two slots on
/// `monday()` and a clock that only moves when advanced.
pub struct TestReservations {
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub service: Arc<ReservationService>,
    pub slot_ids: Vec<String>,
}

impl TestReservations {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap());

        let slots = vec![
            available_slot(DOCTOR_ID, monday(), 1, hm(9, 30), hm(10, 0)),
            available_slot(DOCTOR_ID, monday(), 0, hm(9, 0), hm(9, 30)),
        ];
        store.insert_slots(&slots).await.unwrap();

        let dyn_store: Arc<dyn SchedulingStore> = store.clone();
        let service = Arc::new(ReservationService::new(
            dyn_store,
            Arc::new(clock.clone()),
            Duration::seconds(300),
        ));

        let mut slot_ids: Vec<String> = slots.into_iter().map(|slot| slot.id).collect();
        slot_ids.sort();

        Self {
            store,
            clock,
            service,
            slot_ids,
        }
    }

    pub fn first_slot(&self) -> &str {
        &self.slot_ids[0]
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
