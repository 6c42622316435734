use thiserror::Error;

use shared_database::StoreError;

#[derive(Error, Debug)]
pub enum ReservationError {
    #[error("Slot {0} is not available")]
    SlotUnavailable(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
