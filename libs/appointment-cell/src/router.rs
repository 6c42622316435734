use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers;
use crate::services::BookingService;

pub struct AppointmentState {
    pub bookings: Arc<BookingService>,
}

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::confirm_booking).get(handlers::list_patient_appointments),
        )
        .route("/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", post(handlers::update_appointment_status))
        .route("/{appointment_id}/calendar-event", put(handlers::set_calendar_event))
        .with_state(state)
}
