pub mod appointment;
pub mod doctor;
pub mod error;
pub mod hold;
pub mod patient;
pub mod slot;
pub mod time_format;

pub use appointment::{Appointment, AppointmentStatus};
pub use doctor::{Doctor, WorkingHours};
pub use hold::Hold;
pub use patient::{Patient, PatientDetails};
pub use slot::{Slot, SlotStatus, SlotTransition};
