use axum::extract::Extension;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    auth::CurrentUser,
    error::ApiError,
    extractors::{Json, Path},
    services::{booking_service, payment_service},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub show_id: String,
    pub selected_seats: Vec<String>,
}

pub async fn create_booking(
    CurrentUser(caller): CurrentUser,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<Value>, ApiError> {
    let booking = booking_service::create_booking(
        &state,
        &caller.user_id,
        &body.show_id,
        &body.selected_seats,
    )
    .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Booked successfully",
        "booking": booking,
    })))
}

pub async fn occupied_seats(
    Path(show_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let seats = booking_service::occupied_seats(&state, &show_id).await?;
    Ok(Json(json!({ "success": true, "occupiedSeats": seats })))
}

pub async fn mark_paid(
    CurrentUser(caller): CurrentUser,
    Path(booking_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let booking = payment_service::mark_paid_by_user(&state, &caller, &booking_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Booking marked as paid",
        "booking": booking,
    })))
}
