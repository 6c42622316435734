use std::path::Path;
use std::sync::Arc;

use chrono::Weekday;
use tracing::{debug, info, warn};

use shared_database::SchedulingStore;
use shared_models::{Doctor, WorkingHours};

use crate::models::DirectoryError;

pub struct DoctorDirectoryService {
    store: Arc<dyn SchedulingStore>,
}

impl DoctorDirectoryService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DirectoryError> {
        Ok(self.store.list_doctors().await?)
    }

    pub async fn get_doctor(&self, doctor_id: &str) -> Result<Doctor, DirectoryError> {
        self.store
            .get_doctor(doctor_id)
            .await?
            .ok_or_else(|| DirectoryError::NotFound(doctor_id.to_string()))
    }

    /// Stores a doctor after checking the schedule can produce slots.
    pub async fn register(&self, doctor: &Doctor) -> Result<(), DirectoryError> {
        let problems = doctor.schedule_problems();
        if !problems.is_empty() {
            return Err(DirectoryError::InvalidSchedule(problems.join("; ")));
        }

        self.store.save_doctor(doctor).await?;
        debug!("Registered doctor {} ({})", doctor.id, doctor.name);
        Ok(())
    }

    /// Registers every doctor in `doctors`, skipping invalid entries.
    /// Returns how many were stored.
    pub async fn seed(&self, doctors: &[Doctor]) -> Result<usize, DirectoryError> {
        let mut stored = 0;
        for doctor in doctors {
            match self.register(doctor).await {
                Ok(()) => stored += 1,
                Err(DirectoryError::InvalidSchedule(reason)) => {
                    warn!("Skipping doctor {}: {}", doctor.id, reason);
                }
                Err(e) => return Err(e),
            }
        }

        info!("Seeded {} of {} doctors", stored, doctors.len());
        Ok(stored)
    }
}

/// Reads a JSON array of doctors.
pub fn load_doctors(path: impl AsRef<Path>) -> Result<Vec<Doctor>, DirectoryError> {
    let path = path.as_ref();
    let file_error = |reason: String| DirectoryError::DoctorsFile {
        path: path.display().to_string(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| file_error(e.to_string()))
}

#[allow(clippy::too_many_arguments)]
fn seed_doctor(
    id: &str,
    name: &str,
    specialization: &str,
    qualification: &str,
    experience_years: u32,
    consultation_fee: f64,
    available_days: &[Weekday],
    hours: (u32, u32),
    slot_duration_minutes: u32,
    bio: &str,
) -> Doctor {
    let at = |hour| chrono::NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(chrono::NaiveTime::MIN);
    let email = format!(
        "{}@medibook.com",
        name.trim_start_matches("Dr. ").to_lowercase().replace(' ', ".")
    );

    Doctor {
        id: id.to_string(),
        name: name.to_string(),
        email,
        specialization: specialization.to_string(),
        qualification: qualification.to_string(),
        experience_years,
        bio: bio.to_string(),
        consultation_fee,
        available_days: available_days.to_vec(),
        working_hours: WorkingHours {
            start: at(hours.0),
            end: at(hours.1),
        },
        slot_duration_minutes,
    }
}

/// Doctors registered when no doctors file is configured.
pub fn default_doctors() -> Vec<Doctor> {
    use Weekday::*;

    vec![
        seed_doctor(
            "doc-1",
            "Dr. Sarah Johnson",
            "Cardiologist",
            "MD, FACC",
            15,
            150.0,
            &[Mon, Tue, Wed, Thu, Fri],
            (9, 17),
            30,
            "Board-certified cardiologist focused on preventive cardiology and heart failure management.",
        ),
        seed_doctor(
            "doc-2",
            "Dr. Michael Chen",
            "Dermatologist",
            "MD, FAAD",
            12,
            120.0,
            &[Mon, Wed, Fri],
            (10, 18),
            20,
            "Dermatologist treating acne, eczema and skin cancer.",
        ),
        seed_doctor(
            "doc-3",
            "Dr. Emily Rodriguez",
            "Pediatrician",
            "MD, FAAP",
            10,
            100.0,
            &[Tue, Wed, Thu, Sat],
            (8, 16),
            30,
            "Pediatrician caring for children from birth through adolescence.",
        ),
        seed_doctor(
            "doc-4",
            "Dr. James Wilson",
            "Orthopedic Surgeon",
            "MD, FAAOS",
            20,
            200.0,
            &[Mon, Tue, Thu],
            (9, 15),
            45,
            "Orthopedic surgeon specializing in joint replacement and sports medicine.",
        ),
        seed_doctor(
            "doc-5",
            "Dr. Lisa Patel",
            "General Physician",
            "MD, ABFM",
            8,
            80.0,
            &[Mon, Tue, Wed, Thu, Fri, Sat],
            (8, 20),
            20,
            "General physician focused on preventive medicine and chronic disease management.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_doctors_have_valid_schedules() {
        let doctors = default_doctors();

        assert_eq!(doctors.len(), 5);
        assert!(doctors.iter().all(|doctor| doctor.schedule_problems().is_empty()));
        assert_eq!(doctors[0].email, "sarah.johnson@medibook.com");
        assert_eq!(doctors[1].slot_duration_minutes, 20);
    }
}
