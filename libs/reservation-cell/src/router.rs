use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::{ExpirySweeper, ReservationService};

pub struct ReservationState {
    pub reservations: Arc<ReservationService>,
    pub sweeper: Arc<ExpirySweeper>,
}

pub fn create_reservation_router(state: Arc<ReservationState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_slots))
        .route("/hold", post(handlers::acquire_hold))
        .route("/release", post(handlers::release_hold))
        .route("/holds/{hold_id}/remaining", get(handlers::hold_time_remaining))
        .route("/sweeper/stats", get(handlers::sweeper_stats))
        .with_state(state)
}
