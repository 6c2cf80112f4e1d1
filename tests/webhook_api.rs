mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::Value;

use cinema_booking_api::stripe::sign;
use common::{add_show, bearer, book, spawn_app, stripe_signature, USER_TOKEN, WEBHOOK_SECRET};

fn checkout_completed(booking_id: &str) -> String {
    serde_json::json!({
        "id": "evt_test",
        "type": "checkout.session.completed",
        "data": { "object": { "metadata": { "bookingId": booking_id } } }
    })
    .to_string()
}

async fn booking_is_paid(app: &common::TestApp) -> bool {
    let body: Value = bearer(app.server.get("/api/user/bookings"), USER_TOKEN)
        .await
        .json();
    body["bookings"][0]["isPaid"].as_bool().unwrap()
}

#[tokio::test]
async fn signed_checkout_event_marks_booking_paid() {
    let app = spawn_app();
    let show_id = add_show(&app, "550", 10.0).await;
    let booking = book(&app, USER_TOKEN, &show_id, &["E1"]).await;
    let payload = checkout_completed(booking["booking"]["_id"].as_str().unwrap());
    let now = Utc::now().timestamp();
    let signature = format!(
        "t={now},v1={}",
        sign(WEBHOOK_SECRET, now, payload.as_bytes()).unwrap()
    );

    let response = stripe_signature(app.server.post("/api/stripe"), &signature)
        .text(payload)
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["received"], true);
    assert!(booking_is_paid(&app).await);
}

#[tokio::test]
async fn forged_or_unsigned_event_is_rejected() {
    let app = spawn_app();
    let show_id = add_show(&app, "550", 10.0).await;
    let booking = book(&app, USER_TOKEN, &show_id, &["E2"]).await;
    let payload = checkout_completed(booking["booking"]["_id"].as_str().unwrap());
    let now = Utc::now().timestamp();
    let forged = format!("t={now},v1={}", sign("whsec_wrong", now, payload.as_bytes()).unwrap());

    let response = stripe_signature(app.server.post("/api/stripe"), &forged)
        .text(payload.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let unsigned = app.server.post("/api/stripe").text(payload).await;
    assert_eq!(unsigned.status_code(), StatusCode::BAD_REQUEST);

    assert!(!booking_is_paid(&app).await);
}

#[tokio::test]
async fn unrelated_event_types_are_acknowledged() {
    let app = spawn_app();
    let payload = serde_json::json!({
        "id": "evt_other",
        "type": "customer.created",
        "data": { "object": {} }
    })
    .to_string();
    let now = Utc::now().timestamp();
    let signature = format!(
        "t={now},v1={}",
        sign(WEBHOOK_SECRET, now, payload.as_bytes()).unwrap()
    );

    let response = stripe_signature(app.server.post("/api/stripe"), &signature)
        .text(payload)
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["received"], true);
}
