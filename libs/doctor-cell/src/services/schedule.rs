use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use shared_database::SchedulingStore;

use crate::models::{DirectoryError, MaterializeReport};
use crate::services::catalog::SlotCatalogService;

/// Writes generated slots into the store ahead of time.
///
/// Insertion is insert-if-absent, so running this repeatedly over an
/// overlapping horizon only adds the days that are new and never resets a
/// slot that is already held or booked.
pub struct ScheduleService {
    store: Arc<dyn SchedulingStore>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn materialize(&self, from: NaiveDate, days: u32) -> Result<MaterializeReport, DirectoryError> {
        let doctors = self.store.list_doctors().await?;
        let mut report = MaterializeReport {
            from: Some(from),
            days,
            doctors: doctors.len(),
            ..MaterializeReport::default()
        };

        for doctor in &doctors {
            let slots = SlotCatalogService::generate_range(doctor, from, days);
            let inserted = self.store.insert_slots(&slots).await?;
            debug!(
                "Doctor {}: {} slots generated, {} new",
                doctor.id,
                slots.len(),
                inserted
            );
            report.slots_generated += slots.len();
            report.slots_inserted += inserted;
        }

        info!(
            "Materialized {} new slots for {} doctors over {} days from {}",
            report.slots_inserted, report.doctors, days, from
        );
        Ok(report)
    }

    pub async fn materialize_doctor(
        &self,
        doctor_id: &str,
        from: NaiveDate,
        days: u32,
    ) -> Result<usize, DirectoryError> {
        let doctor = self
            .store
            .get_doctor(doctor_id)
            .await?
            .ok_or_else(|| DirectoryError::NotFound(doctor_id.to_string()))?;

        let slots = SlotCatalogService::generate_range(&doctor, from, days);
        Ok(self.store.insert_slots(&slots).await?)
    }
}
