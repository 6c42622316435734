use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use shared_models::{
    Appointment, AppointmentStatus, Doctor, Hold, Patient, PatientDetails, Slot, SlotTransition,
};

use crate::error::StoreResult;

/// Persistence for doctors, slots, holds, patients and appointments.
///
/// Every method that changes slot or appointment state is a guarded
/// conditional update: implementations must check the expected state and write
/// the new one as a single indivisible operation, returning `None` when the
/// guard does not match. A read followed by a separate write is never an
/// acceptable implementation.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    // Doctors

    async fn save_doctor(&self, doctor: &Doctor) -> StoreResult<()>;

    async fn get_doctor(&self, doctor_id: &str) -> StoreResult<Option<Doctor>>;

    async fn list_doctors(&self) -> StoreResult<Vec<Doctor>>;

    // Slots

    /// Inserts slots whose ids are not yet stored and leaves existing ones
    /// untouched. Returns how many were inserted.
    async fn insert_slots(&self, slots: &[Slot]) -> StoreResult<usize>;

    async fn get_slot(&self, slot_id: &str) -> StoreResult<Option<Slot>>;

    /// Slots of one doctor on one date, in no particular order.
    async fn slots_for_day(&self, doctor_id: &str, date: NaiveDate) -> StoreResult<Vec<Slot>>;

    /// Applies `transition` if its guard matches; returns the updated slot.
    async fn transition_slot(
        &self,
        slot_id: &str,
        transition: &SlotTransition,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Slot>>;

    // Holds

    /// Moves the hold's slot from available to held and stores the hold, both
    /// in one step. Returns `None` (and stores nothing) if the slot is missing
    /// or not available.
    async fn place_hold(&self, hold: &Hold, now: DateTime<Utc>) -> StoreResult<Option<Slot>>;

    async fn get_hold(&self, hold_id: &str) -> StoreResult<Option<Hold>>;

    /// Returns `false` when the hold was already gone.
    async fn delete_hold(&self, hold: &Hold) -> StoreResult<bool>;

    /// Holds whose expiry is at or before `now`.
    async fn expired_holds(&self, now: DateTime<Utc>) -> StoreResult<Vec<Hold>>;

    // Patients

    async fn upsert_patient(
        &self,
        patient_id: &str,
        details: &PatientDetails,
        now: DateTime<Utc>,
    ) -> StoreResult<Patient>;

    async fn get_patient(&self, patient_id: &str) -> StoreResult<Option<Patient>>;

    // Appointments

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()>;

    async fn get_appointment(&self, appointment_id: &str) -> StoreResult<Option<Appointment>>;

    async fn appointments_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Appointment>>;

    /// Sets `to` only if the appointment is currently `from`.
    async fn transition_appointment(
        &self,
        appointment_id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Appointment>>;

    async fn set_calendar_event(
        &self,
        appointment_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Appointment>>;

    // Health

    async fn ping(&self) -> StoreResult<()>;
}
