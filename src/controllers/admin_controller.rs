use axum::extract::Extension;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    auth::AdminUser, error::ApiError, extractors::Json, services::report_service, state::AppState,
};

pub async fn is_admin(AdminUser(caller): AdminUser) -> Json<Value> {
    Json(json!({ "success": true, "isAdmin": caller.is_admin() }))
}

pub async fn dashboard(
    _admin: AdminUser,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let data = report_service::dashboard(&state, Utc::now()).await?;
    Ok(Json(json!({
        "success": true,
        "dashboardData": data,
        "currency": state.currency,
    })))
}

pub async fn all_shows(
    _admin: AdminUser,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let shows = report_service::list_all_shows(&state, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "shows": shows })))
}

pub async fn all_bookings(
    _admin: AdminUser,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let bookings = report_service::list_all_bookings(&state).await?;
    Ok(Json(json!({ "success": true, "bookings": bookings })))
}
