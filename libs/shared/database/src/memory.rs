use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use shared_models::{
    Appointment, AppointmentStatus, Doctor, Hold, Patient, PatientDetails, Slot, SlotTransition,
};

use crate::error::StoreResult;
use crate::store::SchedulingStore;

type DayKey = (String, NaiveDate);

/// In-process store for tests and single-node runs.
///
/// Each slot sits behind its own mutex: a transition locks only the slot it
/// touches, checks the guard and writes under that one lock. `place_hold`
/// stores the hold record before the slot lock is released, so no caller can
/// observe a held slot whose hold has not been written yet.
#[derive(Default)]
pub struct MemoryStore {
    doctors: RwLock<HashMap<String, Doctor>>,
    slots: RwLock<HashMap<String, Arc<Mutex<Slot>>>>,
    day_index: RwLock<HashMap<DayKey, Vec<String>>>,
    holds: RwLock<HashMap<String, Hold>>,
    patients: Mutex<HashMap<String, Patient>>,
    appointments: RwLock<HashMap<String, Appointment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot_cell(&self, slot_id: &str) -> Option<Arc<Mutex<Slot>>> {
        self.slots.read().await.get(slot_id).cloned()
    }

    pub async fn hold_count(&self) -> usize {
        self.holds.read().await.len()
    }

    pub async fn appointment_count(&self) -> usize {
        self.appointments.read().await.len()
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn save_doctor(&self, doctor: &Doctor) -> StoreResult<()> {
        self.doctors
            .write()
            .await
            .insert(doctor.id.clone(), doctor.clone());
        Ok(())
    }

    async fn get_doctor(&self, doctor_id: &str) -> StoreResult<Option<Doctor>> {
        Ok(self.doctors.read().await.get(doctor_id).cloned())
    }

    async fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        let mut doctors: Vec<Doctor> = self.doctors.read().await.values().cloned().collect();
        doctors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(doctors)
    }

    async fn insert_slots(&self, slots: &[Slot]) -> StoreResult<usize> {
        let mut stored = self.slots.write().await;
        let mut index = self.day_index.write().await;
        let mut inserted = 0;

        for slot in slots {
            if stored.contains_key(&slot.id) {
                continue;
            }
            stored.insert(slot.id.clone(), Arc::new(Mutex::new(slot.clone())));
            index
                .entry((slot.doctor_id.clone(), slot.date))
                .or_default()
                .push(slot.id.clone());
            inserted += 1;
        }

        Ok(inserted)
    }

    async fn get_slot(&self, slot_id: &str) -> StoreResult<Option<Slot>> {
        match self.slot_cell(slot_id).await {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn slots_for_day(&self, doctor_id: &str, date: NaiveDate) -> StoreResult<Vec<Slot>> {
        let ids = self
            .day_index
            .read()
            .await
            .get(&(doctor_id.to_string(), date))
            .cloned()
            .unwrap_or_default();

        let cells: Vec<Arc<Mutex<Slot>>> = {
            let stored = self.slots.read().await;
            ids.iter().filter_map(|id| stored.get(id).cloned()).collect()
        };

        let mut slots = Vec::with_capacity(cells.len());
        for cell in cells {
            slots.push(cell.lock().await.clone());
        }
        Ok(slots)
    }

    async fn transition_slot(
        &self,
        slot_id: &str,
        transition: &SlotTransition,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Slot>> {
        let Some(cell) = self.slot_cell(slot_id).await else {
            return Ok(None);
        };

        let mut slot = cell.lock().await;
        if !transition.permits(&slot) {
            debug!(
                "Slot {} guard failed for {} (status {})",
                slot_id,
                transition.name(),
                slot.status
            );
            return Ok(None);
        }

        transition.apply(&mut slot, now);
        Ok(Some(slot.clone()))
    }

    async fn place_hold(&self, hold: &Hold, now: DateTime<Utc>) -> StoreResult<Option<Slot>> {
        let Some(cell) = self.slot_cell(&hold.slot_id).await else {
            return Ok(None);
        };

        let transition = hold.acquire_transition();
        let mut slot = cell.lock().await;
        if !transition.permits(&slot) {
            return Ok(None);
        }

        transition.apply(&mut slot, now);
        self.holds.write().await.insert(hold.id.clone(), hold.clone());
        Ok(Some(slot.clone()))
    }

    async fn get_hold(&self, hold_id: &str) -> StoreResult<Option<Hold>> {
        Ok(self.holds.read().await.get(hold_id).cloned())
    }

    async fn delete_hold(&self, hold: &Hold) -> StoreResult<bool> {
        Ok(self.holds.write().await.remove(&hold.id).is_some())
    }

    async fn expired_holds(&self, now: DateTime<Utc>) -> StoreResult<Vec<Hold>> {
        Ok(self
            .holds
            .read()
            .await
            .values()
            .filter(|hold| hold.expires_at <= now)
            .cloned()
            .collect())
    }

    async fn upsert_patient(
        &self,
        patient_id: &str,
        details: &PatientDetails,
        now: DateTime<Utc>,
    ) -> StoreResult<Patient> {
        let mut patients = self.patients.lock().await;
        let patient = patients
            .entry(patient_id.to_string())
            .and_modify(|existing| existing.update_contact(details, now))
            .or_insert_with(|| Patient::new(patient_id, details, now));
        Ok(patient.clone())
    }

    async fn get_patient(&self, patient_id: &str) -> StoreResult<Option<Patient>> {
        Ok(self.patients.lock().await.get(patient_id).cloned())
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        self.appointments
            .write()
            .await
            .insert(appointment.id.clone(), appointment.clone());
        Ok(())
    }

    async fn get_appointment(&self, appointment_id: &str) -> StoreResult<Option<Appointment>> {
        Ok(self.appointments.read().await.get(appointment_id).cloned())
    }

    async fn appointments_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Appointment>> {
        Ok(self
            .appointments
            .read()
            .await
            .values()
            .filter(|appointment| appointment.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn transition_appointment(
        &self,
        appointment_id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Appointment>> {
        let mut appointments = self.appointments.write().await;
        match appointments.get_mut(appointment_id) {
            Some(appointment) if appointment.status == from => {
                appointment.status = to;
                appointment.updated_at = now;
                Ok(Some(appointment.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_calendar_event(
        &self,
        appointment_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Appointment>> {
        let mut appointments = self.appointments.write().await;
        Ok(appointments.get_mut(appointment_id).map(|appointment| {
            appointment.calendar_event_id = Some(event_id.to_string());
            appointment.updated_at = now;
            appointment.clone()
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
