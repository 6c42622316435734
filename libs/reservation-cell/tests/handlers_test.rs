mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use reservation_cell::{create_reservation_router, ExpirySweeper, ReservationState, SweeperConfig};

use common::TestReservations;

fn create_test_app(t: &TestReservations) -> Router {
    let sweeper = Arc::new(ExpirySweeper::new(t.service.clone(), SweeperConfig::default()));
    create_reservation_router(Arc::new(ReservationState {
        reservations: t.service.clone(),
        sweeper,
    }))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
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

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_list_slots_hides_holder() {
    let t = TestReservations::new().await;
    t.service.acquire_hold(t.first_slot(), "patient-a").await.unwrap();
    let app = create_test_app(&t);

    let response = app
        .oneshot(get("/?doctor_id=doc-1&date=2026-10-19"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["slots"][0]["start_time"], "09:00");
    assert_eq!(json["slots"][0]["status"], "held");
    assert!(json["slots"][0].get("held_by").is_none());
    assert_eq!(json["slots"][1]["status"], "available");
}

#[tokio::test]
async fn test_hold_then_conflict() {
    let t = TestReservations::new().await;
    let app = create_test_app(&t);

    let response = app
        .clone()
        .oneshot(post_json("/hold", json!({"slot_id": t.first_slot(), "patient_id": "patient-a"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["hold"]["slot_id"], t.first_slot());
    assert_eq!(json["remaining_seconds"], 300);

    let response = app
        .oneshot(post_json("/hold", json!({"slot_id": t.first_slot(), "patient_id": "patient-b"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_release_always_answers_ok() {
    let t = TestReservations::new().await;
    let hold = t.service.acquire_hold(t.first_slot(), "patient-a").await.unwrap();
    let app = create_test_app(&t);

    let request = json!({"hold_id": hold.id, "patient_id": "patient-a"});
    let response = app.clone().oneshot(post_json("/release", request.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["released"], true);

    let response = app.oneshot(post_json("/release", request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["released"], false);
}

#[tokio::test]
async fn test_missing_fields_are_bad_requests() {
    let t = TestReservations::new().await;
    let app = create_test_app(&t);

    let response = app
        .clone()
        .oneshot(post_json("/hold", json!({"slot_id": t.first_slot()})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json("/hold", json!({"slot_id": "", "patient_id": "patient-a"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remaining_and_stats() {
    let t = TestReservations::new().await;
    let hold = t.service.acquire_hold(t.first_slot(), "patient-a").await.unwrap();
    t.clock.advance_seconds(60);
    let app = create_test_app(&t);

    let response = app
        .clone()
        .oneshot(get(&format!("/holds/{}/remaining", hold.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["remaining_seconds"], 240);

    let response = app.oneshot(get("/sweeper/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["stats"]["runs"], 0);
}
