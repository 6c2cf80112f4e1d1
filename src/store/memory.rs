use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::models::{
    booking_model::Booking,
    movie_model::Movie,
    show_model::{SeatLabel, Show},
};

use super::{Reservation, Store};

#[derive(Default)]
struct Collections {
    movies: HashMap<String, Movie>,
    shows: HashMap<String, Show>,
    bookings: HashMap<String, Booking>,
    users: BTreeMap<String, Vec<String>>,
}

/// Process-local store; every operation runs under a single lock.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_movie(&self, id: &str) -> anyhow::Result<Option<Movie>> {
        Ok(self.collections.lock().await.movies.get(id).cloned())
    }

    async fn insert_movie(&self, movie: &Movie) -> anyhow::Result<Movie> {
        let mut collections = self.collections.lock().await;
        let stored = collections
            .movies
            .entry(movie.id.clone())
            .or_insert_with(|| movie.clone());
        Ok(stored.clone())
    }

    async fn find_movies(&self, ids: &[String]) -> anyhow::Result<Vec<Movie>> {
        let collections = self.collections.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| collections.movies.get(id).cloned())
            .collect())
    }

    async fn insert_shows(&self, shows: &[Show]) -> anyhow::Result<()> {
        let mut collections = self.collections.lock().await;
        for show in shows {
            collections.shows.insert(show.id.clone(), show.clone());
        }
        Ok(())
    }

    async fn find_show(&self, id: &str) -> anyhow::Result<Option<Show>> {
        Ok(self.collections.lock().await.shows.get(id).cloned())
    }

    async fn find_shows(&self, ids: &[String]) -> anyhow::Result<Vec<Show>> {
        let collections = self.collections.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| collections.shows.get(id).cloned())
            .collect())
    }

    async fn find_shows_from(
        &self,
        from: DateTime<Utc>,
        movie_id: Option<&str>,
    ) -> anyhow::Result<Vec<Show>> {
        let collections = self.collections.lock().await;
        let mut shows: Vec<Show> = collections
            .shows
            .values()
            .filter(|show| show.show_date_time >= from)
            .filter(|show| movie_id.map_or(true, |id| show.movie == id))
            .cloned()
            .collect();
        shows.sort_by(|a, b| {
            a.show_date_time
                .cmp(&b.show_date_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(shows)
    }

    async fn reserve_seats(
        &self,
        show_id: &str,
        seats: &[SeatLabel],
        booking_id: &str,
    ) -> anyhow::Result<Reservation> {
        let mut collections = self.collections.lock().await;
        let Some(show) = collections.shows.get_mut(show_id) else {
            return Ok(Reservation::ShowMissing);
        };

        let taken: Vec<SeatLabel> = seats
            .iter()
            .filter(|seat| show.occupied_seats.contains_key(*seat))
            .cloned()
            .collect();
        if !taken.is_empty() {
            return Ok(Reservation::Conflict(taken));
        }

        for seat in seats {
            show.occupied_seats
                .insert(seat.clone(), booking_id.to_string());
        }
        Ok(Reservation::Reserved)
    }

    async fn release_seats(
        &self,
        show_id: &str,
        seats: &[SeatLabel],
        booking_id: &str,
    ) -> anyhow::Result<()> {
        let mut collections = self.collections.lock().await;
        if let Some(show) = collections.shows.get_mut(show_id) {
            for seat in seats {
                if show.occupied_seats.get(seat).map(String::as_str) == Some(booking_id) {
                    show.occupied_seats.remove(seat);
                }
            }
        }
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> anyhow::Result<()> {
        let mut collections = self.collections.lock().await;
        collections
            .bookings
            .insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn find_booking(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        Ok(self.collections.lock().await.bookings.get(id).cloned())
    }

    async fn mark_booking_paid(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let mut collections = self.collections.lock().await;
        Ok(collections.bookings.get_mut(id).map(|booking| {
            booking.is_paid = true;
            booking.clone()
        }))
    }

    async fn find_bookings(&self, user_id: Option<&str>) -> anyhow::Result<Vec<Booking>> {
        let collections = self.collections.lock().await;
        let mut bookings: Vec<Booking> = collections
            .bookings
            .values()
            .filter(|booking| user_id.map_or(true, |id| booking.user == id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn toggle_favorite(
        &self,
        user_id: &str,
        movie_id: &str,
    ) -> anyhow::Result<(bool, Vec<String>)> {
        let mut collections = self.collections.lock().await;
        let favorites = collections.users.entry(user_id.to_string()).or_default();
        let added = match favorites.iter().position(|id| id == movie_id) {
            Some(index) => {
                favorites.remove(index);
                false
            }
            None => {
                favorites.push(movie_id.to_string());
                true
            }
        };
        Ok((added, favorites.clone()))
    }

    async fn favorites(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        let collections = self.collections.lock().await;
        Ok(collections.users.get(user_id).cloned().unwrap_or_default())
    }

    async fn touch_user(&self, user_id: &str) -> anyhow::Result<()> {
        let mut collections = self.collections.lock().await;
        collections.users.entry(user_id.to_string()).or_default();
        Ok(())
    }

    async fn count_users(&self) -> anyhow::Result<u64> {
        Ok(self.collections.lock().await.users.len() as u64)
    }
}
