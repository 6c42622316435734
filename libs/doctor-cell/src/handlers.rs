use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_database::SchedulingStore;
use shared_models::error::AppError;

use crate::models::DirectoryError;
use crate::services::DoctorDirectoryService;

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(_) => AppError::NotFound(err.to_string()),
            DirectoryError::InvalidSchedule(msg) => AppError::ValidationError(msg),
            DirectoryError::DoctorsFile { .. } => AppError::Internal(err.to_string()),
            DirectoryError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(store): State<Arc<dyn SchedulingStore>>,
) -> Result<Json<Value>, AppError> {
    let directory = DoctorDirectoryService::new(store);
    let doctors = directory.list_doctors().await?;

    Ok(Json(json!({
        "success": true,
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(store): State<Arc<dyn SchedulingStore>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let directory = DoctorDirectoryService::new(store);
    let doctor = directory.get_doctor(&doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}
