pub mod catalog;
pub mod directory;
pub mod schedule;

pub use catalog::SlotCatalogService;
pub use directory::{default_doctors, load_doctors, DoctorDirectoryService};
pub use schedule::ScheduleService;
