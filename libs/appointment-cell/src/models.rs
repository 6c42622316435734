use serde::{Deserialize, Serialize};
use thiserror::Error;

use reservation_cell::ReservationError;
use shared_database::StoreError;
use shared_models::{AppointmentStatus, PatientDetails};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmBookingRequest {
    pub hold_id: String,
    pub patient_id: String,
    pub patient: PatientDetails,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub appointment_id: String,
    pub patient_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventRequest {
    pub event_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientAppointmentsQuery {
    pub patient_id: String,
}

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Hold is invalid or has expired")]
    HoldInvalidOrExpired,

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment belongs to another patient")]
    Forbidden,

    #[error("Invalid appointment status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<ReservationError> for AppointmentError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::SlotUnavailable(_) => AppointmentError::HoldInvalidOrExpired,
            ReservationError::Store(e) => AppointmentError::Store(e),
        }
    }
}
