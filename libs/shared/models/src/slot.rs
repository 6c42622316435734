use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time_format::hhmm;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Held,
    Booked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Held => "held",
            SlotStatus::Booked => "booked",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bookable window for one doctor on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub held_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub held_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Slot {
    pub fn slot_id(doctor_id: &str, date: NaiveDate, index: usize) -> String {
        format!("slot-{}-{}-{}", doctor_id, date.format("%Y-%m-%d"), index)
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    /// `held` exactly when both hold fields are present.
    pub fn is_consistent(&self) -> bool {
        let has_hold_fields = self.held_by.is_some() && self.held_until.is_some();
        let has_no_hold_fields = self.held_by.is_none() && self.held_until.is_none();

        match self.status {
            SlotStatus::Held => has_hold_fields,
            SlotStatus::Available | SlotStatus::Booked => has_no_hold_fields,
        }
    }
}

/// Expected state a slot must be in for a transition to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotGuard<'a> {
    pub status: SlotStatus,
    pub held_by: Option<&'a str>,
    pub held_until: Option<DateTime<Utc>>,
}

/// State written when the guard matches.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotChange<'a> {
    pub status: SlotStatus,
    pub held_by: Option<&'a str>,
    pub held_until: Option<DateTime<Utc>>,
}

/// Every slot mutation is one of these compare-and-set transitions. Stores
/// evaluate the guard and write the change as a single indivisible step.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotTransition {
    /// available -> held
    Acquire { holder_id: String, held_until: DateTime<Utc> },
    /// held (by holder, until the same instant) -> available
    Release { holder_id: String, held_until: DateTime<Utc> },
    /// held (by holder, until the same instant) -> booked
    Book { holder_id: String, held_until: DateTime<Utc> },
    /// booked -> available, after a cancellation
    Reopen,
}

impl SlotTransition {
    pub fn name(&self) -> &'static str {
        match self {
            SlotTransition::Acquire { .. } => "acquire",
            SlotTransition::Release { .. } => "release",
            SlotTransition::Book { .. } => "book",
            SlotTransition::Reopen => "reopen",
        }
    }

    pub fn guard(&self) -> SlotGuard<'_> {
        match self {
            SlotTransition::Acquire { .. } => SlotGuard {
                status: SlotStatus::Available,
                held_by: None,
                held_until: None,
            },
            SlotTransition::Release { holder_id, held_until }
            | SlotTransition::Book { holder_id, held_until } => SlotGuard {
                status: SlotStatus::Held,
                held_by: Some(holder_id.as_str()),
                held_until: Some(*held_until),
            },
            SlotTransition::Reopen => SlotGuard {
                status: SlotStatus::Booked,
                held_by: None,
                held_until: None,
            },
        }
    }

    pub fn change(&self) -> SlotChange<'_> {
        match self {
            SlotTransition::Acquire { holder_id, held_until } => SlotChange {
                status: SlotStatus::Held,
                held_by: Some(holder_id.as_str()),
                held_until: Some(*held_until),
            },
            SlotTransition::Release { .. } | SlotTransition::Reopen => SlotChange {
                status: SlotStatus::Available,
                held_by: None,
                held_until: None,
            },
            SlotTransition::Book { .. } => SlotChange {
                status: SlotStatus::Booked,
                held_by: None,
                held_until: None,
            },
        }
    }

    /// Whether the guard matches the slot's current state. A `None` field in
    /// the guard is not checked.
    pub fn permits(&self, slot: &Slot) -> bool {
        let guard = self.guard();

        if slot.status != guard.status {
            return false;
        }
        if let Some(holder) = guard.held_by {
            if slot.held_by.as_deref() != Some(holder) {
                return false;
            }
        }
        if let Some(until) = guard.held_until {
            if slot.held_until != Some(until) {
                return false;
            }
        }
        true
    }

    /// Writes the change. Callers check `permits` under the same lock first.
    pub fn apply(&self, slot: &mut Slot, now: DateTime<Utc>) {
        let change = self.change();
        slot.status = change.status;
        slot.held_by = change.held_by.map(str::to_string);
        slot.held_until = change.held_until;
        slot.updated_at = Some(now);
    }
}
