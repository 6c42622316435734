use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use appointment_cell::BookingService;
use doctor_cell::{default_doctors, load_doctors, DoctorDirectoryService, MaterializeReport, ScheduleService};
use reservation_cell::{ExpirySweeper, ReservationService, SweeperConfig};
use shared_config::AppConfig;
use shared_database::SchedulingStore;
use shared_utils::Clock;

const REMATERIALIZE_EVERY: Duration = Duration::from_secs(24 * 60 * 60);

/// Everything the routers and background tasks share.
pub struct AppServices {
    pub config: AppConfig,
    pub store: Arc<dyn SchedulingStore>,
    pub clock: Arc<dyn Clock>,
    pub reservations: Arc<ReservationService>,
    pub sweeper: Arc<ExpirySweeper>,
    pub bookings: Arc<BookingService>,
}

impl AppServices {
    pub fn new(config: AppConfig, store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        let reservations = Arc::new(ReservationService::from_config(
            store.clone(),
            clock.clone(),
            &config,
        ));
        let sweeper = Arc::new(ExpirySweeper::new(
            reservations.clone(),
            SweeperConfig {
                interval: config.sweep_interval(),
            },
        ));
        let bookings = Arc::new(BookingService::new(reservations.clone()));

        Self {
            config,
            store,
            clock,
            reservations,
            sweeper,
            bookings,
        }
    }

    /// Registers doctors from `DOCTORS_FILE`, or the built-in list when it is
    /// unset, then writes slots for the booking horizon.
    pub async fn prepare_catalog(&self) -> Result<MaterializeReport> {
        let doctors = match &self.config.doctors_file {
            Some(path) => {
                info!("Loading doctors from {}", path);
                load_doctors(path)?
            }
            None => default_doctors(),
        };

        DoctorDirectoryService::new(self.store.clone())
            .seed(&doctors)
            .await
            .context("Failed to register doctors")?;

        self.materialize().await
    }

    async fn materialize(&self) -> Result<MaterializeReport> {
        let today = self.clock.now().date_naive();
        let report = ScheduleService::new(self.store.clone())
            .materialize(today, self.config.slot_horizon_days)
            .await
            .context("Failed to materialize slots")?;
        Ok(report)
    }

    /// Extends the horizon once a day so the last bookable day keeps moving.
    pub async fn rematerialize_daily(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(REMATERIALIZE_EVERY);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if self.sweeper.is_shutdown().await {
                break;
            }
            if let Err(e) = self.materialize().await {
                error!("Daily slot materialization failed: {:#}", e);
            }
        }
    }
}
