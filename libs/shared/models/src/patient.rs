use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact details supplied when a booking is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub calendar_connected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(id: &str, details: &PatientDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            name: details.name.clone(),
            email: details.email.clone(),
            phone: details.phone.clone(),
            calendar_connected: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites contact fields; identity and creation time are kept.
    pub fn update_contact(&mut self, details: &PatientDetails, now: DateTime<Utc>) {
        self.name = details.name.clone();
        self.email = details.email.clone();
        self.phone = details.phone.clone();
        self.updated_at = now;
    }
}
