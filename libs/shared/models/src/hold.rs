use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot::{Slot, SlotTransition};
use crate::time_format::hhmm;

/// A time-boxed claim by one holder on one slot. Doctor, date and times are
/// copied from the slot so the hold can be shown without a lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hold {
    pub id: String,
    pub slot_id: String,
    pub holder_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Hold {
    pub fn new(slot: &Slot, holder_id: &str, now: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            id: format!("hold-{}", Uuid::new_v4()),
            slot_id: slot.id.clone(),
            holder_id: holder_id.to_string(),
            doctor_id: slot.doctor_id.clone(),
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            expires_at: now + duration,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn remaining_seconds_at(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }

    pub fn is_held_by(&self, holder_id: &str) -> bool {
        self.holder_id == holder_id
    }

    pub fn acquire_transition(&self) -> SlotTransition {
        SlotTransition::Acquire {
            holder_id: self.holder_id.clone(),
            held_until: self.expires_at,
        }
    }

    pub fn release_transition(&self) -> SlotTransition {
        SlotTransition::Release {
            holder_id: self.holder_id.clone(),
            held_until: self.expires_at,
        }
    }

    pub fn book_transition(&self) -> SlotTransition {
        SlotTransition::Book {
            holder_id: self.holder_id.clone(),
            held_until: self.expires_at,
        }
    }
}
