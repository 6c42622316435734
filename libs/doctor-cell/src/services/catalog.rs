use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use shared_models::{Doctor, Slot, SlotStatus};

const SECONDS_PER_MINUTE: u32 = 60;

/// Turns a doctor's working hours into the bookable slots of one day.
pub struct SlotCatalogService;

impl SlotCatalogService {
    /// Slots for `doctor` on `date`, ordered by start time, all available.
    ///
    /// The day is walked in slot-duration steps from opening time; a slot is
    /// emitted only if it ends at or before closing time. Days outside the
    /// doctor's available weekdays, and schedules with a zero duration, yield
    /// nothing.
    pub fn generate(doctor: &Doctor, date: NaiveDate) -> Vec<Slot> {
        if !doctor.works_on(date.weekday()) || doctor.slot_duration_minutes == 0 {
            return Vec::new();
        }

        let Some(step) = doctor.slot_duration_minutes.checked_mul(SECONDS_PER_MINUTE) else {
            return Vec::new();
        };
        let close = doctor.working_hours.end.num_seconds_from_midnight();
        let mut cursor = doctor.working_hours.start.num_seconds_from_midnight();
        let mut slots = Vec::new();

        while let Some(next) = cursor.checked_add(step).filter(|next| *next <= close) {
            let (Some(start_time), Some(end_time)) = (
                NaiveTime::from_num_seconds_from_midnight_opt(cursor, 0),
                NaiveTime::from_num_seconds_from_midnight_opt(next, 0),
            ) else {
                break;
            };

            slots.push(Slot {
                id: Slot::slot_id(&doctor.id, date, slots.len()),
                doctor_id: doctor.id.clone(),
                date,
                start_time,
                end_time,
                status: SlotStatus::Available,
                held_by: None,
                held_until: None,
                updated_at: None,
            });
            cursor = next;
        }

        slots
    }

    /// Slots for every date in `[from, from + days)`.
    pub fn generate_range(doctor: &Doctor, from: NaiveDate, days: u32) -> Vec<Slot> {
        from.iter_days()
            .take(days as usize)
            .flat_map(|date| Self::generate(doctor, date))
            .collect()
    }
}
