use std::sync::Arc;

use tokio::sync::{Notify, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use crate::error::ReservationError;
use crate::models::{SweepStats, SweeperConfig};
use crate::services::reservation::ReservationService;

/// Periodically reclaims lapsed holds.
///
/// Reclamation also runs lazily on every list, acquire and confirm; this task
/// only shortens how long a lapsed hold can linger between requests.
pub struct ExpirySweeper {
    reservations: Arc<ReservationService>,
    config: SweeperConfig,
    is_shutdown: RwLock<bool>,
    wake: Notify,
    stats: RwLock<SweepStats>,
}

impl ExpirySweeper {
    pub fn new(reservations: Arc<ReservationService>, config: SweeperConfig) -> Self {
        Self {
            reservations,
            config,
            is_shutdown: RwLock::new(false),
            wake: Notify::new(),
            stats: RwLock::new(SweepStats::default()),
        }
    }

    /// Runs until `shutdown` is called. The first sweep happens immediately.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), ReservationError> {
        info!("Starting expiry sweeper");

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {}
            }

            if *self.is_shutdown.read().await {
                break;
            }

            if let Err(e) = self.sweep_once().await {
                error!("Expiry sweep failed: {}", e);
            }
        }

        info!("Expiry sweeper stopped");
        Ok(())
    }

    /// One reclamation pass, recorded in the stats.
    pub async fn sweep_once(&self) -> Result<usize, ReservationError> {
        let started_at = self.reservations.clock().now();
        let result = self.reservations.reclaim_expired().await;

        let mut stats = self.stats.write().await;
        stats.runs += 1;
        stats.last_run_at = Some(started_at);
        match &result {
            Ok(reclaimed) => {
                stats.last_reclaimed = *reclaimed;
                stats.reclaimed_total += *reclaimed as u64;
                stats.last_error = None;
                debug!("Sweep {} reclaimed {} holds", stats.runs, reclaimed);
            }
            Err(e) => {
                stats.last_reclaimed = 0;
                stats.last_error = Some(e.to_string());
            }
        }

        result
    }

    pub async fn stats(&self) -> SweepStats {
        self.stats.read().await.clone()
    }

    pub async fn shutdown(&self) {
        info!("Shutting down expiry sweeper");
        *self.is_shutdown.write().await = true;
        self.wake.notify_one();
    }

    pub async fn is_shutdown(&self) -> bool {
        *self.is_shutdown.read().await
    }
}
