use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::ApiError,
    models::{
        booking_model::BookingView,
        show_model::{ShowDetail, ShowReport},
    },
    services::{payment_service::booking_views, show_service::show_details},
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_bookings: usize,
    pub total_revenue: f64,
    pub active_shows: Vec<ShowDetail>,
    pub total_user: u64,
}

async fn upcoming_details(state: &AppState, now: DateTime<Utc>) -> Result<Vec<ShowDetail>, ApiError> {
    let shows = state.store.find_shows_from(now, None).await?;
    show_details(state.store.as_ref(), shows).await
}

/// Upcoming shows with seat counts and earnings, recomputed on every call.
pub async fn list_all_shows(
    state: &AppState,
    now: DateTime<Utc>,
) -> Result<Vec<ShowReport>, ApiError> {
    Ok(upcoming_details(state, now)
        .await?
        .into_iter()
        .map(ShowReport::new)
        .collect())
}

pub async fn list_all_bookings(state: &AppState) -> Result<Vec<BookingView>, ApiError> {
    let bookings = state.store.find_bookings(None).await?;
    booking_views(state.store.as_ref(), bookings).await
}

/// Totals over paid bookings plus the currently scheduled shows.
pub async fn dashboard(state: &AppState, now: DateTime<Utc>) -> Result<DashboardData, ApiError> {
    let paid: Vec<_> = state
        .store
        .find_bookings(None)
        .await?
        .into_iter()
        .filter(|booking| booking.is_paid)
        .collect();

    Ok(DashboardData {
        total_bookings: paid.len(),
        total_revenue: paid.iter().map(|booking| booking.amount).sum(),
        active_shows: upcoming_details(state, now).await?,
        total_user: state.store.count_users().await?,
    })
}
