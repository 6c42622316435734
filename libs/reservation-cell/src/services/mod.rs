pub mod reservation;
pub mod sweeper;

pub use reservation::ReservationService;
pub use sweeper::ExpirySweeper;
