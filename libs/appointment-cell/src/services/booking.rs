use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use reservation_cell::ReservationService;
use shared_database::SchedulingStore;
use shared_models::{Appointment, AppointmentStatus, Hold, SlotTransition};

use crate::models::{AppointmentError, ConfirmBookingRequest};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::validation::PatientValidationService;

/// Turns holds into appointments and moves appointments through their
/// lifecycle.
pub struct BookingService {
    reservations: Arc<ReservationService>,
    lifecycle: AppointmentLifecycleService,
    validation: PatientValidationService,
}

impl BookingService {
    pub fn new(reservations: Arc<ReservationService>) -> Self {
        Self {
            reservations,
            lifecycle: AppointmentLifecycleService::new(),
            validation: PatientValidationService::new(),
        }
    }

    fn store(&self) -> &Arc<dyn SchedulingStore> {
        self.reservations.store()
    }

    fn now(&self) -> DateTime<Utc> {
        self.reservations.clock().now()
    }

    /// Converts a live hold into a scheduled appointment.
    ///
    /// The slot's move from held to booked is the only gate: once it
    /// succeeds the booking stands, and the remaining writes cannot undo it.
    /// If the appointment record then fails to store, the slot stays booked
    /// without an appointment; that case is logged at error level.
    pub async fn confirm(&self, request: &ConfirmBookingRequest) -> Result<Appointment, AppointmentError> {
        self.validation.validate_details(&request.patient)?;

        self.reservations.reclaim_expired().await?;

        let hold = self.live_hold(&request.hold_id, &request.patient_id).await?;
        let now = self.now();

        if hold.is_expired_at(now) {
            debug!("Hold {} lapsed at {}, reclaiming", hold.id, hold.expires_at);
            self.reservations.reclaim_hold(&hold).await?;
            return Err(AppointmentError::HoldInvalidOrExpired);
        }

        if self
            .store()
            .transition_slot(&hold.slot_id, &hold.book_transition(), now)
            .await?
            .is_none()
        {
            warn!("Slot {} is no longer held under {}", hold.slot_id, hold.id);
            return Err(AppointmentError::HoldInvalidOrExpired);
        }

        if let Err(e) = self
            .store()
            .upsert_patient(&request.patient_id, &request.patient, now)
            .await
        {
            warn!("Failed to save patient {} details: {}", request.patient_id, e);
        }

        let appointment = Appointment::from_hold(&hold, request.reason.trim(), now);
        if let Err(e) = self.store().insert_appointment(&appointment).await {
            error!(
                "Slot {} is booked under hold {} but appointment {} could not be stored: {}",
                hold.slot_id, hold.id, appointment.id, e
            );
            return Err(e.into());
        }

        if let Err(e) = self.store().delete_hold(&hold).await {
            warn!("Failed to delete consumed hold {}: {}", hold.id, e);
        }

        info!(
            "Appointment {} booked on slot {} for patient {}",
            appointment.id, appointment.slot_id, appointment.patient_id
        );
        Ok(appointment)
    }

    async fn live_hold(&self, hold_id: &str, patient_id: &str) -> Result<Hold, AppointmentError> {
        match self.store().get_hold(hold_id).await? {
            Some(hold) if hold.is_held_by(patient_id) => Ok(hold),
            Some(_) => {
                warn!("Patient {} tried to confirm hold {} owned by someone else", patient_id, hold_id);
                Err(AppointmentError::HoldInvalidOrExpired)
            }
            None => {
                debug!("Hold {} not found", hold_id);
                Err(AppointmentError::HoldInvalidOrExpired)
            }
        }
    }

    /// Cancels a scheduled appointment on the patient's behalf and reopens
    /// its slot.
    pub async fn cancel(&self, appointment_id: &str, patient_id: &str) -> Result<Appointment, AppointmentError> {
        let appointment = self.get(appointment_id).await?;
        if appointment.patient_id != patient_id {
            warn!(
                "Patient {} tried to cancel appointment {} of patient {}",
                patient_id, appointment_id, appointment.patient_id
            );
            return Err(AppointmentError::Forbidden);
        }

        self.transition(appointment, AppointmentStatus::Cancelled).await
    }

    pub async fn complete(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        self.update_status(appointment_id, AppointmentStatus::Completed).await
    }

    pub async fn mark_no_show(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        self.update_status(appointment_id, AppointmentStatus::NoShow).await
    }

    /// Moves an appointment to `completed` or `no_show`. Cancellation goes
    /// through `cancel`, which checks the patient.
    pub async fn update_status(
        &self,
        appointment_id: &str,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        if !matches!(new_status, AppointmentStatus::Completed | AppointmentStatus::NoShow) {
            return Err(AppointmentError::ValidationError(format!(
                "status must be completed or no_show, got {}",
                new_status
            )));
        }

        let appointment = self.get(appointment_id).await?;
        self.transition(appointment, new_status).await
    }

    async fn transition(
        &self,
        appointment: Appointment,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        self.lifecycle
            .validate_status_transition(appointment.status, new_status)?;

        let now = self.now();
        let Some(updated) = self
            .store()
            .transition_appointment(&appointment.id, appointment.status, new_status, now)
            .await?
        else {
            // Someone else moved it between our read and the guarded write.
            let current = self.get(&appointment.id).await?;
            return Err(AppointmentError::InvalidStatusTransition {
                from: current.status,
                to: new_status,
            });
        };

        if self.lifecycle.releases_slot(new_status) {
            match self
                .store()
                .transition_slot(&updated.slot_id, &SlotTransition::Reopen, now)
                .await?
            {
                Some(_) => debug!("Slot {} reopened", updated.slot_id),
                None => warn!(
                    "Slot {} was not booked when appointment {} was cancelled",
                    updated.slot_id, updated.id
                ),
            }
        }

        info!("Appointment {} is now {}", updated.id, updated.status);
        Ok(updated)
    }

    pub async fn get(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        self.store()
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    /// A patient's appointments, earliest first.
    pub async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = self.store().appointments_for_patient(patient_id).await?;
        appointments.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(appointments)
    }

    /// Records the external calendar event created for an appointment.
    pub async fn set_calendar_event(
        &self,
        appointment_id: &str,
        event_id: &str,
    ) -> Result<Appointment, AppointmentError> {
        if event_id.trim().is_empty() {
            return Err(AppointmentError::ValidationError("event_id is required".to_string()));
        }

        self.store()
            .set_calendar_event(appointment_id, event_id.trim(), self.now())
            .await?
            .ok_or(AppointmentError::NotFound)
    }
}
