use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use shared_models::error::AppError;

use crate::models::{
    AppointmentError, CalendarEventRequest, CancelAppointmentRequest, ConfirmBookingRequest,
    PatientAppointmentsQuery, UpdateStatusRequest,
};
use crate::router::AppointmentState;

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::HoldInvalidOrExpired => AppError::Conflict(err.to_string()),
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::Forbidden => AppError::Forbidden(err.to_string()),
            AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(err.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::Store(e) => {
                error!("Appointment storage failure: {}", e);
                AppError::Database(e.to_string())
            }
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn confirm_booking(
    State(state): State<Arc<AppointmentState>>,
    payload: Result<Json<ConfirmBookingRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    require("hold_id", &request.hold_id)?;
    require("patient_id", &request.patient_id)?;

    let appointment = state.bookings.confirm(&request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    payload: Result<Json<CancelAppointmentRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    require("appointment_id", &request.appointment_id)?;
    require("patient_id", &request.patient_id)?;

    let appointment = state
        .bookings
        .cancel(&request.appointment_id, &request.patient_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<PatientAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    require("patient_id", &query.patient_id)?;

    let appointments = state.bookings.list_for_patient(&query.patient_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.bookings.get(&appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let appointment = state
        .bookings
        .update_status(&appointment_id, request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn set_calendar_event(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<String>,
    payload: Result<Json<CalendarEventRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let appointment = state
        .bookings
        .set_calendar_event(&appointment_id, &request.event_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}
