use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::warn;

use appointment_cell::{appointment_routes, AppointmentState};
use doctor_cell::doctor_routes;
use reservation_cell::{create_reservation_router, ReservationState};
use shared_database::SchedulingStore;
use shared_models::error::AppError;

use crate::state::AppServices;

pub fn create_router(services: &AppServices) -> Router {
    let reservation_state = Arc::new(ReservationState {
        reservations: services.reservations.clone(),
        sweeper: services.sweeper.clone(),
    });
    let appointment_state = Arc::new(AppointmentState {
        bookings: services.bookings.clone(),
    });

    Router::new()
        .route("/", get(|| async { "MediBook API is running!" }))
        .route("/health", get(health_check))
        .with_state(services.store.clone())
        .nest("/doctors", doctor_routes(services.store.clone()))
        .nest("/slots", create_reservation_router(reservation_state))
        .nest("/appointments", appointment_routes(appointment_state))
}

async fn health_check(
    State(store): State<Arc<dyn SchedulingStore>>,
) -> Result<Json<Value>, AppError> {
    store.ping().await.map_err(|e| {
        warn!("Health check failed: {}", e);
        AppError::ServiceUnavailable("Storage is not reachable".to_string())
    })?;

    Ok(Json(json!({
        "success": true,
        "status": "healthy"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Datelike, Duration, TimeZone, Utc, Weekday};
    use tower::ServiceExt;

    use shared_config::AppConfig;
    use shared_database::MemoryStore;
    use shared_utils::ManualClock;

    async fn create_test_app() -> (Router, ManualClock) {
        // A Sunday, so the first Monday of the horizon is tomorrow.
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap());
        let services = AppServices::new(
            AppConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
        );
        services.prepare_catalog().await.unwrap();
        (create_router(&services), clock)
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy_store() {
        let (app, _) = create_test_app().await;

        let (status, json) = call(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn seeded_doctors_are_listed() {
        let (app, _) = create_test_app().await;

        let (status, json) = call(&app, get("/doctors")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 5);
    }

    #[tokio::test]
    async fn hold_confirm_and_cancel_through_the_api() {
        let (app, clock) = create_test_app().await;
        let monday = clock_date(&clock) + Duration::days(1);
        assert_eq!(monday.weekday(), Weekday::Mon);

        let (status, json) = call(&app, get(&format!("/slots?doctor_id=doc-1&date={}", monday))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 16);
        let slot_id = json["slots"][0]["id"].as_str().unwrap().to_string();

        let (status, json) = call(
            &app,
            post("/slots/hold", json!({"slot_id": slot_id, "patient_id": "patient-a"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let hold_id = json["hold"]["id"].as_str().unwrap().to_string();

        let (status, _) = call(
            &app,
            post("/slots/hold", json!({"slot_id": slot_id, "patient_id": "patient-b"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, json) = call(
            &app,
            post(
                "/appointments",
                json!({
                    "hold_id": hold_id,
                    "patient_id": "patient-a",
                    "patient": {"name": "Jane Doe", "email": "jane@example.com", "phone": "+1-555-0100"},
                    "reason": "checkup"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let appointment_id = json["appointment"]["id"].as_str().unwrap().to_string();

        let (_, json) = call(&app, get(&format!("/slots?doctor_id=doc-1&date={}", monday))).await;
        assert_eq!(json["slots"][0]["status"], "booked");

        let (status, _) = call(
            &app,
            post(
                "/appointments/cancel",
                json!({"appointment_id": appointment_id, "patient_id": "patient-a"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = call(&app, get(&format!("/slots?doctor_id=doc-1&date={}", monday))).await;
        assert_eq!(json["slots"][0]["status"], "available");
    }

    fn clock_date(clock: &ManualClock) -> chrono::NaiveDate {
        use shared_utils::Clock;
        clock.now().date_naive()
    }
}
