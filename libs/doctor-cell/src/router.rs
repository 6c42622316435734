use std::sync::Arc;

use axum::{routing::get, Router};

use shared_database::SchedulingStore;

use crate::handlers;

pub fn doctor_routes(store: Arc<dyn SchedulingStore>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .with_state(store)
}
