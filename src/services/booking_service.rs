use std::collections::BTreeSet;

use crate::{
    error::ApiError,
    models::{booking_model::Booking, show_model::SeatLabel},
    state::AppState,
    store::Reservation,
    utils::is_valid_seat_label,
};

/// Trims, validates and deduplicates the requested seat labels.
pub fn normalize_seats(seats: &[String]) -> Result<Vec<SeatLabel>, ApiError> {
    let mut labels = BTreeSet::new();
    for seat in seats {
        let label = seat.trim();
        if !is_valid_seat_label(label) {
            return Err(ApiError::InvalidRequest(format!("Invalid seat label: {seat}")));
        }
        labels.insert(label.to_string());
    }
    if labels.is_empty() {
        return Err(ApiError::InvalidRequest("Select at least one seat".to_string()));
    }
    Ok(labels.into_iter().collect())
}

/// Reserves `seats` on a show for `user_id` and records an unpaid booking.
///
/// Either every requested seat is claimed by the new booking or nothing is written.
pub async fn create_booking(
    state: &AppState,
    user_id: &str,
    show_id: &str,
    seats: &[String],
) -> Result<Booking, ApiError> {
    let seats = normalize_seats(seats)?;
    let show = state
        .store
        .find_show(show_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Show not found".to_string()))?;

    let booking = Booking::new(user_id, &show, seats);

    match state
        .store
        .reserve_seats(&show.id, &booking.booked_seats, &booking.id)
        .await?
    {
        Reservation::Reserved => {}
        Reservation::Conflict(taken) => {
            tracing::info!(show_id, user_id, seats = ?taken, "requested seats already taken");
            return Err(ApiError::SeatUnavailable { seats: taken });
        }
        Reservation::ShowMissing => return Err(ApiError::NotFound("Show not found".to_string())),
    }

    if let Err(err) = state.store.insert_booking(&booking).await {
        tracing::error!(booking_id = %booking.id, error = ?err, "booking insert failed, releasing seats");
        if let Err(release_err) = state
            .store
            .release_seats(&show.id, &booking.booked_seats, &booking.id)
            .await
        {
            tracing::error!(booking_id = %booking.id, error = ?release_err, "seat release failed");
        }
        return Err(ApiError::Internal(err));
    }

    if let Err(err) = state.store.touch_user(user_id).await {
        tracing::warn!(user_id, error = ?err, "could not record user");
    }

    tracing::info!(
        booking_id = %booking.id,
        show_id,
        user_id,
        seats = booking.booked_seats.len(),
        amount = booking.amount,
        "booking created"
    );
    Ok(booking)
}

pub async fn occupied_seats(state: &AppState, show_id: &str) -> Result<Vec<SeatLabel>, ApiError> {
    let show = state
        .store
        .find_show(show_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Show not found".to_string()))?;
    Ok(show.occupied_seats.into_keys().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::show_model::Show, test_support::test_state};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn labels(seats: &[&str]) -> Vec<String> {
        seats.iter().map(|s| s.to_string()).collect()
    }

    async fn seeded(price: f64, taken: &[&str]) -> (AppState, Show) {
        let (state, _) = test_state(Vec::new());
        let mut show = Show::new("550", Utc::now() + Duration::days(1), price);
        for seat in taken {
            show.occupied_seats.insert(seat.to_string(), "earlier".to_string());
        }
        state.store.insert_shows(&[show.clone()]).await.unwrap();
        (state, show)
    }

    #[test]
    fn seats_are_deduplicated_and_validated() {
        assert_eq!(
            normalize_seats(&labels(&["B2", " A1", "B2"])).unwrap(),
            labels(&["A1", "B2"])
        );
        assert!(normalize_seats(&[]).is_err());
        assert!(normalize_seats(&labels(&["A1", "occupiedSeats.$"])).is_err());
    }

    #[tokio::test]
    async fn booking_free_seats_prices_and_reserves_them() {
        let (state, show) = seeded(10.0, &["A1"]).await;

        let booking = create_booking(&state, "user_1", &show.id, &labels(&["A2", "A3"]))
            .await
            .unwrap();

        assert_eq!(booking.amount, 20.0);
        assert!(!booking.is_paid);
        assert_eq!(
            occupied_seats(&state, &show.id).await.unwrap(),
            labels(&["A1", "A2", "A3"])
        );
        let stored = state.store.find_show(&show.id).await.unwrap().unwrap();
        assert_eq!(stored.occupied_seats["A2"], booking.id);
    }

    #[tokio::test]
    async fn taken_seat_fails_without_side_effects() {
        let (state, show) = seeded(10.0, &["A1"]).await;

        let err = create_booking(&state, "user_1", &show.id, &labels(&["A1", "A4"]))
            .await
            .unwrap_err();

        match err {
            ApiError::SeatUnavailable { seats } => assert_eq!(seats, labels(&["A1"])),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            occupied_seats(&state, &show.id).await.unwrap(),
            labels(&["A1"])
        );
        assert!(state.store.find_bookings(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_show_is_not_found() {
        let (state, _) = seeded(10.0, &[]).await;
        let err = create_booking(&state, "user_1", "missing", &labels(&["A1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(matches!(
            occupied_seats(&state, "missing").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_overlapping_bookings_claim_each_seat_once() {
        let (state, show) = seeded(10.0, &[]).await;
        let state = Arc::new(state);

        let mut handles = Vec::new();
        for user in 0..8 {
            let state = state.clone();
            let show_id = show.id.clone();
            handles.push(tokio::spawn(async move {
                create_booking(&state, &format!("user_{user}"), &show_id, &labels(&["C1", "C2"])).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(state.store.find_bookings(None).await.unwrap().len(), 1);
    }
}
