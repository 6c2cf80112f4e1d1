#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use axum::http::{header, HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use cinema_booking_api::{
    app,
    auth::{Caller, StaticAuthenticator},
    catalog::StaticCatalog,
    models::movie_model::{Movie, MovieSummary},
    notify::{Event, EventNotifier},
    state::AppState,
    store::MemoryStore,
};

pub const USER_TOKEN: &str = "user-token";
pub const OTHER_TOKEN: &str = "other-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const WEBHOOK_SECRET: &str = "whsec_test";

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<Event>>,
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn send(&self, event: Event) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub catalog: Arc<StaticCatalog>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn movie(id: &str, title: &str) -> Movie {
    Movie {
        id: id.to_string(),
        title: title.to_string(),
        overview: format!("{title} overview"),
        poster_path: Some(format!("/{id}.jpg")),
        backdrop_path: None,
        genres: Vec::new(),
        casts: Vec::new(),
        release_date: Some("1999-10-15".to_string()),
        original_language: Some("en".to_string()),
        tagline: String::new(),
        vote_average: 8.4,
        runtime: Some(139),
    }
}

pub fn summary(id: i64, title: &str) -> MovieSummary {
    MovieSummary {
        id,
        title: title.to_string(),
        overview: String::new(),
        poster_path: None,
        backdrop_path: None,
        release_date: None,
        vote_average: 7.0,
        genre_ids: vec![18],
        original_language: Some("en".to_string()),
    }
}

pub fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(
        StaticCatalog::new()
            .with_movie(movie("550", "Fight Club"))
            .with_movie(movie("603", "The Matrix"))
            .with_now_playing(vec![summary(550, "Fight Club"), summary(603, "The Matrix")]),
    );
    let auth = StaticAuthenticator::new()
        .with_caller(USER_TOKEN, Caller::user("user_1"))
        .with_caller(OTHER_TOKEN, Caller::user("user_2"))
        .with_caller(ADMIN_TOKEN, Caller::admin("admin_1"));
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState::new(store.clone(), catalog.clone(), Arc::new(auth), notifier.clone())
        .with_webhook_secret(WEBHOOK_SECRET)
        .with_currency("$");

    TestApp {
        server: TestServer::new(app(Arc::new(state))).unwrap(),
        store,
        catalog,
        notifier,
    }
}

pub fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

pub fn stripe_signature(request: TestRequest, value: &str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("stripe-signature"),
        HeaderValue::from_str(value).unwrap(),
    )
}

/// Schedules one show of `movie_id` tomorrow evening through the admin route.
pub async fn add_show(app: &TestApp, movie_id: &str, price: f64) -> String {
    let date = (Utc::now() + Duration::days(1)).format("%Y-%m-%d").to_string();
    let body: Value = bearer(app.server.post("/api/show/add"), ADMIN_TOKEN)
        .json(&json!({
            "movieId": movie_id,
            "showsInput": [{ "date": date, "time": ["20:00"] }],
            "showPrice": price,
        }))
        .await
        .json();
    assert_eq!(body["success"], true, "show was not added: {body}");
    body["newShowId"].as_str().unwrap().to_string()
}

pub async fn book(app: &TestApp, token: &str, show_id: &str, seats: &[&str]) -> Value {
    bearer(app.server.post("/api/booking/create"), token)
        .json(&json!({ "showId": show_id, "selectedSeats": seats }))
        .await
        .json()
}
