use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::SchedulingStore;
use shared_models::{Hold, Slot};
use shared_utils::Clock;

use crate::error::ReservationError;

/// Holds, releases and reclaims slots.
///
/// Every slot change goes through a guarded transition in the store, so this
/// service keeps no locks of its own and any number of instances may run
/// against the same store.
pub struct ReservationService {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
    hold_duration: Duration,
}

impl ReservationService {
    pub fn new(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>, hold_duration: Duration) -> Self {
        Self {
            store,
            clock,
            hold_duration,
        }
    }

    pub fn from_config(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        let hold_duration = Duration::from_std(config.hold_duration()).unwrap_or_else(|_| {
            warn!("Hold duration out of range, using 5 minutes");
            Duration::minutes(5)
        });
        Self::new(store, clock, hold_duration)
    }

    pub fn store(&self) -> &Arc<dyn SchedulingStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn hold_duration(&self) -> Duration {
        self.hold_duration
    }

    /// All slots of a doctor on a date, ordered by start time, after lapsed
    /// holds have been reclaimed. Held and booked slots are included.
    pub async fn list_slots(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<Slot>, ReservationError> {
        self.reclaim_expired().await?;

        let mut slots = self.store.slots_for_day(doctor_id, date).await?;
        slots.sort_by_key(|slot| slot.start_time);
        Ok(slots)
    }

    pub async fn acquire_hold(&self, slot_id: &str, holder_id: &str) -> Result<Hold, ReservationError> {
        self.reclaim_expired().await?;

        let Some(slot) = self.store.get_slot(slot_id).await? else {
            debug!("Hold requested for unknown slot {}", slot_id);
            return Err(ReservationError::SlotUnavailable(slot_id.to_string()));
        };

        let now = self.clock.now();
        let hold = Hold::new(&slot, holder_id, now, self.hold_duration);

        match self.store.place_hold(&hold, now).await? {
            Some(_) => {
                info!(
                    "Slot {} held by {} until {} ({})",
                    slot_id, holder_id, hold.expires_at, hold.id
                );
                Ok(hold)
            }
            None => {
                debug!("Slot {} not available for {}", slot_id, holder_id);
                Err(ReservationError::SlotUnavailable(slot_id.to_string()))
            }
        }
    }

    /// Gives a hold back. Unknown holds, holder mismatches and holds another
    /// caller already removed return `false`.
    pub async fn release_hold(&self, hold_id: &str, holder_id: &str) -> Result<bool, ReservationError> {
        let Some(hold) = self.store.get_hold(hold_id).await? else {
            return Ok(false);
        };

        if !hold.is_held_by(holder_id) {
            warn!("Holder {} tried to release hold {} owned by someone else", holder_id, hold_id);
            return Ok(false);
        }

        let now = self.clock.now();
        if self
            .store
            .transition_slot(&hold.slot_id, &hold.release_transition(), now)
            .await?
            .is_none()
        {
            debug!("Slot {} no longer held under {}", hold.slot_id, hold_id);
        }
        if !self.store.delete_hold(&hold).await? {
            debug!("Hold {} was already gone when {} released it", hold_id, holder_id);
            return Ok(false);
        }

        info!("Hold {} on slot {} released by {}", hold_id, hold.slot_id, holder_id);
        Ok(true)
    }

    /// Frees the slot of every lapsed hold and drops the hold. Returns how
    /// many holds were removed by this call.
    pub async fn reclaim_expired(&self) -> Result<usize, ReservationError> {
        let now = self.clock.now();
        let expired = self.store.expired_holds(now).await?;

        let mut reclaimed = 0;
        for hold in &expired {
            if self.reclaim_hold(hold).await? {
                reclaimed += 1;
            }
        }

        if reclaimed > 0 {
            info!("Reclaimed {} expired holds", reclaimed);
        }
        Ok(reclaimed)
    }

    /// Returns the slot to available if it is still held under this exact
    /// hold, then deletes the hold. `false` if another caller got there first.
    pub async fn reclaim_hold(&self, hold: &Hold) -> Result<bool, ReservationError> {
        let now = self.clock.now();
        if let Some(slot) = self
            .store
            .transition_slot(&hold.slot_id, &hold.release_transition(), now)
            .await?
        {
            debug!("Slot {} reopened after hold {} lapsed", slot.id, hold.id);
        }

        Ok(self.store.delete_hold(hold).await?)
    }

    /// Whole seconds left on a hold; zero when it is gone or has lapsed.
    pub async fn hold_time_remaining(&self, hold_id: &str) -> Result<u64, ReservationError> {
        let remaining = self
            .store
            .get_hold(hold_id)
            .await?
            .map(|hold| hold.remaining_seconds_at(self.clock.now()))
            .unwrap_or(0);
        Ok(remaining)
    }
}
