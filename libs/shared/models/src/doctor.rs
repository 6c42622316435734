use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::time_format::hhmm;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkingHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub specialization: String,
    pub qualification: String,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub consultation_fee: f64,
    pub available_days: Vec<Weekday>,
    pub working_hours: WorkingHours,
    pub slot_duration_minutes: u32,
}

impl Doctor {
    pub fn works_on(&self, weekday: Weekday) -> bool {
        self.available_days.contains(&weekday)
    }

    /// Reasons this doctor's schedule cannot produce slots, if any.
    pub fn schedule_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.id.trim().is_empty() {
            problems.push("doctor id is empty".to_string());
        }
        if self.slot_duration_minutes == 0 {
            problems.push(format!("doctor {} has a zero slot duration", self.id));
        }
        if self.working_hours.start >= self.working_hours.end {
            problems.push(format!(
                "doctor {} working hours start {} is not before end {}",
                self.id,
                self.working_hours.start.format(hhmm::FORMAT),
                self.working_hours.end.format(hhmm::FORMAT),
            ));
        } else {
            let window = (self.working_hours.end - self.working_hours.start).num_minutes();
            if i64::from(self.slot_duration_minutes) > window {
                problems.push(format!(
                    "doctor {} slot duration of {} minutes exceeds the {} minute working day",
                    self.id, self.slot_duration_minutes, window
                ));
            }
        }

        problems
    }
}
