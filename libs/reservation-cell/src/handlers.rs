use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use shared_models::error::AppError;

use crate::error::ReservationError;
use crate::models::{AcquireHoldRequest, ReleaseHoldRequest, SlotQuery, SlotView};
use crate::router::ReservationState;

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::SlotUnavailable(_) => {
                AppError::Conflict("Slot is no longer available".to_string())
            }
            ReservationError::Store(e) => {
                error!("Reservation storage failure: {}", e);
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
pub async fn list_slots(
    State(state): State<Arc<ReservationState>>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    require("doctor_id", &query.doctor_id)?;

    let slots = state.reservations.list_slots(&query.doctor_id, query.date).await?;
    let slots: Vec<SlotView> = slots.iter().map(SlotView::from).collect();

    Ok(Json(json!({
        "success": true,
        "doctor_id": query.doctor_id,
        "date": query.date,
        "slots": slots,
        "total": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn acquire_hold(
    State(state): State<Arc<ReservationState>>,
    payload: Result<Json<AcquireHoldRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    require("slot_id", &request.slot_id)?;
    require("patient_id", &request.patient_id)?;

    let hold = state
        .reservations
        .acquire_hold(&request.slot_id, &request.patient_id)
        .await?;
    let remaining = hold.remaining_seconds_at(state.reservations.clock().now());

    Ok(Json(json!({
        "success": true,
        "hold": hold,
        "remaining_seconds": remaining
    })))
}

#[axum::debug_handler]
pub async fn release_hold(
    State(state): State<Arc<ReservationState>>,
    payload: Result<Json<ReleaseHoldRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    require("hold_id", &request.hold_id)?;
    require("patient_id", &request.patient_id)?;

    let released = state
        .reservations
        .release_hold(&request.hold_id, &request.patient_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "released": released
    })))
}

#[axum::debug_handler]
pub async fn hold_time_remaining(
    State(state): State<Arc<ReservationState>>,
    Path(hold_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let remaining = state.reservations.hold_time_remaining(&hold_id).await?;

    Ok(Json(json!({
        "success": true,
        "hold_id": hold_id,
        "remaining_seconds": remaining
    })))
}

#[axum::debug_handler]
pub async fn sweeper_stats(
    State(state): State<Arc<ReservationState>>,
) -> Result<Json<Value>, AppError> {
    let stats = state.sweeper.stats().await;

    Ok(Json(json!({
        "success": true,
        "stats": stats
    })))
}
