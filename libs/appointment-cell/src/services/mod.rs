pub mod booking;
pub mod lifecycle;
pub mod validation;

pub use booking::BookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use validation::PatientValidationService;
