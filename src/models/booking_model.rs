use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::new_id;

use super::show_model::{SeatLabel, Show, ShowDetail};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub show: String,
    pub amount: f64,
    pub booked_seats: Vec<SeatLabel>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Unpaid booking of `seats` on `show`, priced at the show's ticket price.
    pub fn new(user_id: impl Into<String>, show: &Show, seats: Vec<SeatLabel>) -> Self {
        let amount = seats.len() as f64 * show.show_price;
        Booking {
            id: new_id(),
            user: user_id.into(),
            show: show.id.clone(),
            amount,
            booked_seats: seats,
            is_paid: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub show: ShowDetail,
    pub amount: f64,
    pub booked_seats: Vec<SeatLabel>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

impl BookingView {
    pub fn new(booking: Booking, show: ShowDetail) -> Self {
        BookingView {
            id: booking.id,
            user: booking.user,
            show,
            amount: booking.amount,
            booked_seats: booking.booked_seats,
            is_paid: booking.is_paid,
            created_at: booking.created_at,
        }
    }
}
