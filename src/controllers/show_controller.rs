use axum::extract::Extension;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    auth::AdminUser,
    catalog::fetch_now_playing,
    error::ApiError,
    extractors::{Json, Path},
    services::show_service::{self, ShowInput},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddShowRequest {
    pub movie_id: String,
    pub shows_input: Vec<ShowInput>,
    pub show_price: f64,
}

pub async fn now_playing(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let movies = fetch_now_playing(state.catalog.as_ref()).await?;
    Ok(Json(json!({ "success": true, "movies": movies })))
}

pub async fn add_show(
    AdminUser(admin): AdminUser,
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<AddShowRequest>,
) -> Result<Json<Value>, ApiError> {
    let show_ids =
        show_service::create_shows(&state, &body.movie_id, &body.shows_input, body.show_price)
            .await?;
    tracing::debug!(user_id = %admin.user_id, movie_id = %body.movie_id, "admin added shows");
    Ok(Json(json!({
        "success": true,
        "message": "Show Added successfully.",
        "newShowId": show_ids.first(),
        "showIds": show_ids,
    })))
}

pub async fn all_shows(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let movies = show_service::list_upcoming_shows(&state, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "shows": movies })))
}

pub async fn show_by_movie(
    Path(movie_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let shows = show_service::list_shows_for_movie(&state, &movie_id, Utc::now()).await?;
    Ok(Json(json!({ "success": true, "show": shows })))
}
