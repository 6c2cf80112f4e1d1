use std::collections::HashMap;

use crate::{
    auth::Caller,
    error::ApiError,
    models::{
        booking_model::{Booking, BookingView},
        show_model::ShowDetail,
    },
    services::show_service::show_details,
    state::AppState,
    store::Store,
    stripe::{self, StripeEvent},
};

/// Flags a booking as paid. Calling it again on a paid booking changes nothing.
pub async fn mark_paid(store: &dyn Store, booking_id: &str) -> Result<Booking, ApiError> {
    if let Some(booking) = store.find_booking(booking_id).await? {
        if booking.is_paid {
            return Ok(booking);
        }
    }

    let booking = store
        .mark_booking_paid(booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
    tracing::info!(booking_id, user_id = %booking.user, amount = booking.amount, "booking paid");
    Ok(booking)
}

/// The user-facing "pay now" path: only the booking's owner (or an admin) may flip it.
pub async fn mark_paid_by_user(
    state: &AppState,
    caller: &Caller,
    booking_id: &str,
) -> Result<Booking, ApiError> {
    let booking = state
        .store
        .find_booking(booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
    if booking.user != caller.user_id && !caller.is_admin() {
        tracing::warn!(booking_id, user_id = %caller.user_id, "caller does not own booking");
        return Err(ApiError::Unauthorized(
            "Booking belongs to another user".to_string(),
        ));
    }
    mark_paid(state.store.as_ref(), booking_id).await
}

/// Joins bookings with their show and movie; bookings whose show is gone are skipped.
pub async fn booking_views(
    store: &dyn Store,
    bookings: Vec<Booking>,
) -> Result<Vec<BookingView>, ApiError> {
    let mut show_ids: Vec<String> = bookings.iter().map(|b| b.show.clone()).collect();
    show_ids.sort();
    show_ids.dedup();

    let shows = store.find_shows(&show_ids).await?;
    let details: HashMap<String, ShowDetail> = show_details(store, shows)
        .await?
        .into_iter()
        .map(|detail| (detail.id.clone(), detail))
        .collect();

    let mut views = Vec::with_capacity(bookings.len());
    for booking in bookings {
        if let Some(detail) = details.get(&booking.show).cloned() {
            views.push(BookingView::new(booking, detail));
        }
    }
    Ok(views)
}

pub async fn list_bookings_for_user(
    state: &AppState,
    user_id: &str,
) -> Result<Vec<BookingView>, ApiError> {
    let bookings = state.store.find_bookings(Some(user_id)).await?;
    booking_views(state.store.as_ref(), bookings).await
}

/// Verifies a Stripe delivery and applies it. Returns the booking it marked paid, if any.
pub async fn handle_webhook(
    state: &AppState,
    signature: &str,
    payload: &[u8],
    now: i64,
) -> Result<Option<Booking>, ApiError> {
    if let Err(err) = stripe::verify_signature(signature, payload, &state.stripe_webhook_secret, now) {
        tracing::warn!("rejected webhook with invalid signature");
        return Err(err);
    }

    let event: StripeEvent = serde_json::from_slice(payload)
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed webhook payload: {e}")))?;
    tracing::info!(event_id = %event.id, event_type = %event.event_type, "received payment webhook");

    match event.event_type.as_str() {
        // The booking id travels in the Checkout Session metadata.
        "checkout.session.completed" => {
            let Some(booking_id) = event.booking_id() else {
                tracing::warn!(event_id = %event.id, "payment event carries no booking reference");
                return Ok(None);
            };
            mark_paid(state.store.as_ref(), booking_id).await.map(Some)
        }
        other => {
            tracing::debug!(event_type = other, "ignoring webhook event");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::show_model::Show, test_support::{movie, test_state}};
    use chrono::{Duration, Utc};

    async fn booked(state: &AppState, user: &str) -> Booking {
        state.store.insert_movie(&movie("550", "Fight Club")).await.unwrap();
        let show = Show::new("550", Utc::now() + Duration::days(1), 10.0);
        state.store.insert_shows(&[show.clone()]).await.unwrap();
        let booking = Booking::new(user, &show, vec!["A1".to_string()]);
        state.store.insert_booking(&booking).await.unwrap();
        booking
    }

    #[tokio::test]
    async fn mark_paid_is_idempotent() {
        let (state, _) = test_state(Vec::new());
        let booking = booked(&state, "user_1").await;

        let first = mark_paid(state.store.as_ref(), &booking.id).await.unwrap();
        let second = mark_paid(state.store.as_ref(), &booking.id).await.unwrap();

        assert!(first.is_paid);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_pay() {
        let (state, _) = test_state(Vec::new());
        let booking = booked(&state, "user_1").await;

        let err = mark_paid_by_user(&state, &Caller::user("user_2"), &booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let paid = mark_paid_by_user(&state, &Caller::admin("admin"), &booking.id)
            .await
            .unwrap();
        assert!(paid.is_paid);
    }

    #[tokio::test]
    async fn unknown_booking_is_not_found() {
        let (state, _) = test_state(Vec::new());
        assert!(matches!(
            mark_paid(state.store.as_ref(), "missing").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn user_bookings_are_joined_with_show_and_movie() {
        let (state, _) = test_state(Vec::new());
        let booking = booked(&state, "user_1").await;
        booked(&state, "user_2").await;

        let views = list_bookings_for_user(&state, "user_1").await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, booking.id);
        assert_eq!(views[0].show.movie.title, "Fight Club");
    }

    #[tokio::test]
    async fn signed_checkout_event_marks_booking_paid() {
        let (state, _) = test_state(Vec::new());
        let state = state.with_webhook_secret("whsec_test");
        let booking = booked(&state, "user_1").await;
        let payload = format!(
            r#"{{"id":"evt_1","type":"checkout.session.completed","data":{{"object":{{"metadata":{{"bookingId":"{}"}}}}}}}}"#,
            booking.id
        );
        let now = Utc::now().timestamp();
        let signature = format!(
            "t={now},v1={}",
            stripe::sign("whsec_test", now, payload.as_bytes()).unwrap()
        );

        let paid = handle_webhook(&state, &signature, payload.as_bytes(), now)
            .await
            .unwrap();
        assert_eq!(paid.map(|b| b.is_paid), Some(true));

        let forged = handle_webhook(&state, "t=1,v1=00", payload.as_bytes(), now).await;
        assert!(matches!(forged, Err(ApiError::InvalidSignature)));
    }

    #[tokio::test]
    async fn payment_intent_events_are_acknowledged_without_paying() {
        let (state, _) = test_state(Vec::new());
        let state = state.with_webhook_secret("whsec_test");
        let booking = booked(&state, "user_1").await;
        let payload = format!(
            r#"{{"id":"evt_2","type":"payment_intent.succeeded","data":{{"object":{{"metadata":{{"bookingId":"{}"}}}}}}}}"#,
            booking.id
        );
        let now = Utc::now().timestamp();
        let signature = format!(
            "t={now},v1={}",
            stripe::sign("whsec_test", now, payload.as_bytes()).unwrap()
        );

        let outcome = handle_webhook(&state, &signature, payload.as_bytes(), now)
            .await
            .unwrap();

        assert!(outcome.is_none());
        let stored = state.store.find_booking(&booking.id).await.unwrap().unwrap();
        assert!(!stored.is_paid);
    }
}
