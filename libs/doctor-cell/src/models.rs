use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use shared_database::StoreError;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Doctor not found: {0}")]
    NotFound(String),

    #[error("Invalid doctor schedule: {0}")]
    InvalidSchedule(String),

    #[error("Failed to read doctors file {path}: {reason}")]
    DoctorsFile { path: String, reason: String },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of one materialization pass over the booking horizon.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MaterializeReport {
    pub from: Option<NaiveDate>,
    pub days: u32,
    pub doctors: usize,
    pub slots_generated: usize,
    pub slots_inserted: usize,
}
