use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::new_id;

use super::movie_model::Movie;

pub type SeatLabel = String;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    #[serde(rename = "_id")]
    pub id: String,
    pub movie: String,
    pub show_date_time: DateTime<Utc>,
    pub show_price: f64,
    /// Seat label to the id of the booking holding it.
    #[serde(default)]
    pub occupied_seats: BTreeMap<SeatLabel, String>,
}

impl Show {
    pub fn new(movie_id: impl Into<String>, show_date_time: DateTime<Utc>, show_price: f64) -> Self {
        Show {
            id: new_id(),
            movie: movie_id.into(),
            show_date_time,
            show_price,
            occupied_seats: BTreeMap::new(),
        }
    }
}

/// A show with its movie resolved, as returned to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShowDetail {
    #[serde(rename = "_id")]
    pub id: String,
    pub movie: Movie,
    pub show_date_time: DateTime<Utc>,
    pub show_price: f64,
    pub occupied_seats: BTreeMap<SeatLabel, String>,
}

impl ShowDetail {
    pub fn new(show: Show, movie: Movie) -> Self {
        ShowDetail {
            id: show.id,
            movie,
            show_date_time: show.show_date_time,
            show_price: show.show_price,
            occupied_seats: show.occupied_seats,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShowTime {
    pub time: DateTime<Utc>,
    pub show_id: String,
}

/// A movie together with its upcoming showtimes, grouped by calendar date.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MovieShows {
    pub movie: Movie,
    pub date_time: BTreeMap<String, Vec<ShowTime>>,
    pub all_show_times: Vec<Show>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ShowReport {
    #[serde(flatten)]
    pub show: ShowDetail,
    pub booked_seat_count: usize,
    pub earnings: f64,
}

impl ShowReport {
    pub fn new(show: ShowDetail) -> Self {
        let booked_seat_count = show.occupied_seats.len();
        let earnings = booked_seat_count as f64 * show.show_price;
        ShowReport {
            show,
            booked_seat_count,
            earnings,
        }
    }
}
