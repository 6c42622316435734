use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Doctor, PatientDetails, Slot, SlotStatus, WorkingHours};

pub struct TestDoctor {
    pub id: String,
    pub available_days: Vec<Weekday>,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub slot_duration_minutes: u32,
}

impl Default for TestDoctor {
    fn default() -> Self {
        Self {
            id: format!("doc-{}", Uuid::new_v4().simple()),
            available_days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            start: hm(9, 0),
            end: hm(10, 0),
            slot_duration_minutes: 30,
        }
    }
}

impl TestDoctor {
    pub fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn hours(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn slot_minutes(mut self, minutes: u32) -> Self {
        self.slot_duration_minutes = minutes;
        self
    }

    pub fn days(mut self, days: &[Weekday]) -> Self {
        self.available_days = days.to_vec();
        self
    }

    pub fn to_doctor(&self) -> Doctor {
        Doctor {
            id: self.id.clone(),
            name: format!("Dr. {}", self.id),
            email: format!("{}@example.com", self.id),
            specialization: "General Practice".to_string(),
            qualification: "MD".to_string(),
            experience_years: 10,
            bio: String::new(),
            consultation_fee: 100.0,
            available_days: self.available_days.clone(),
            working_hours: WorkingHours {
                start: self.start,
                end: self.end,
            },
            slot_duration_minutes: self.slot_duration_minutes,
        }
    }
}

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// First date on or after `from` that falls on `weekday`.
pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let offset = (7 + weekday.num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64)
        % 7;
    from + Duration::days(offset)
}

pub fn available_slot(doctor_id: &str, date: NaiveDate, index: usize, start: NaiveTime, end: NaiveTime) -> Slot {
    Slot {
        id: Slot::slot_id(doctor_id, date, index),
        doctor_id: doctor_id.to_string(),
        date,
        start_time: start,
        end_time: end,
        status: SlotStatus::Available,
        held_by: None,
        held_until: None,
        updated_at: None,
    }
}

pub fn patient_details(name: &str) -> PatientDetails {
    PatientDetails {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: "+1-555-0100".to_string(),
    }
}

pub fn test_patient_id() -> String {
    format!("patient-{}", Uuid::new_v4().simple())
}

pub fn test_config() -> AppConfig {
    AppConfig {
        sweep_interval_seconds: 1,
        ..AppConfig::default()
    }
}
