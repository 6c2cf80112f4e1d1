use axum::extract::Extension;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    auth::CurrentUser,
    error::ApiError,
    extractors::Json,
    services::{payment_service, user_service},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFavoriteRequest {
    pub movie_id: String,
}

pub async fn update_favorite(
    CurrentUser(caller): CurrentUser,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<UpdateFavoriteRequest>,
) -> Result<Json<Value>, ApiError> {
    let (added, favorites) =
        user_service::toggle_favorite(&state, &caller.user_id, &body.movie_id).await?;
    let message = if added {
        "Favorite added successfully."
    } else {
        "Favorite removed successfully."
    };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "favorites": favorites,
    })))
}

pub async fn favorites(
    CurrentUser(caller): CurrentUser,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let movies = user_service::favorite_movies(&state, &caller.user_id).await?;
    Ok(Json(json!({ "success": true, "movies": movies })))
}

pub async fn bookings(
    CurrentUser(caller): CurrentUser,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let bookings = payment_service::list_bookings_for_user(&state, &caller.user_id).await?;
    Ok(Json(json!({ "success": true, "bookings": bookings })))
}
