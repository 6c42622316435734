use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::time_format::hhmm;
use shared_models::{Slot, SlotStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub doctor_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireHoldRequest {
    pub slot_id: String,
    pub patient_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseHoldRequest {
    pub hold_id: String,
    pub patient_id: String,
}

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub interval: std::time::Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(30),
        }
    }
}

/// Running totals kept by the background sweeper.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SweepStats {
    pub runs: u64,
    pub reclaimed_total: u64,
    pub last_reclaimed: usize,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Public view of a slot. Holder identity and hold expiry stay internal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotView {
    pub id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: SlotStatus,
}

impl From<&Slot> for SlotView {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id.clone(),
            doctor_id: slot.doctor_id.clone(),
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: slot.status,
        }
    }
}
