use axum::{
    extract::Extension,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod catalog;
pub mod config;
mod controllers;
pub mod error;
pub mod extractors;
pub mod models;
pub mod notify;
pub mod services;
pub mod state;
pub mod store;
pub mod stripe;
mod utils;

#[cfg(test)]
pub(crate) mod test_support;

use controllers::{
    admin_controller, booking_controller, home_controller, show_controller, stripe_controller,
    user_controller,
};
use state::AppState;

fn cors(app_url: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match app_url.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!(app_url = ?app_url, "APP_URL is not a valid origin, allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

/// Builds the HTTP surface over an already wired `AppState`.
pub fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/show/now-playing", get(show_controller::now_playing))
        .route("/show/all", get(show_controller::all_shows))
        .route("/show/add", post(show_controller::add_show))
        .route("/show/:id", get(show_controller::show_by_movie))
        .route("/booking/create", post(booking_controller::create_booking))
        .route("/booking/seats/:show_id", get(booking_controller::occupied_seats))
        .route("/booking/mark-paid/:booking_id", post(booking_controller::mark_paid))
        .route("/user/update-favorite", post(user_controller::update_favorite))
        .route("/user/favorites", get(user_controller::favorites))
        .route("/user/bookings", get(user_controller::bookings))
        .route("/admin/is-admin", get(admin_controller::is_admin))
        .route("/admin/dashboard", get(admin_controller::dashboard))
        .route("/admin/all-shows", get(admin_controller::all_shows))
        .route("/admin/all-bookings", get(admin_controller::all_bookings))
        .route("/stripe", post(stripe_controller::webhook));

    Router::new()
        .route("/", get(home_controller::index))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors(state.app_url.as_deref()))
        .layer(Extension(state))
}
