use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    booking_model::Booking,
    movie_model::Movie,
    show_model::{SeatLabel, Show},
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Outcome of an atomic seat reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    Reserved,
    /// Nothing was written; these requested seats were already taken.
    Conflict(Vec<SeatLabel>),
    ShowMissing,
}

/// Document store holding movies, shows, bookings and user favorites.
///
/// `reserve_seats` must check and claim all seats as one atomic step.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_movie(&self, id: &str) -> anyhow::Result<Option<Movie>>;

    /// Inserts the movie unless one with the same id exists and returns the stored record.
    async fn insert_movie(&self, movie: &Movie) -> anyhow::Result<Movie>;

    async fn find_movies(&self, ids: &[String]) -> anyhow::Result<Vec<Movie>>;

    async fn insert_shows(&self, shows: &[Show]) -> anyhow::Result<()>;

    async fn find_show(&self, id: &str) -> anyhow::Result<Option<Show>>;

    async fn find_shows(&self, ids: &[String]) -> anyhow::Result<Vec<Show>>;

    /// Shows starting at or after `from`, earliest first.
    async fn find_shows_from(
        &self,
        from: DateTime<Utc>,
        movie_id: Option<&str>,
    ) -> anyhow::Result<Vec<Show>>;

    async fn reserve_seats(
        &self,
        show_id: &str,
        seats: &[SeatLabel],
        booking_id: &str,
    ) -> anyhow::Result<Reservation>;

    /// Frees the seats still held by `booking_id`.
    async fn release_seats(
        &self,
        show_id: &str,
        seats: &[SeatLabel],
        booking_id: &str,
    ) -> anyhow::Result<()>;

    async fn insert_booking(&self, booking: &Booking) -> anyhow::Result<()>;

    async fn find_booking(&self, id: &str) -> anyhow::Result<Option<Booking>>;

    /// Sets the paid flag and returns the updated booking, `None` if it does not exist.
    async fn mark_booking_paid(&self, id: &str) -> anyhow::Result<Option<Booking>>;

    /// Bookings newest first, optionally restricted to one user.
    async fn find_bookings(&self, user_id: Option<&str>) -> anyhow::Result<Vec<Booking>>;

    /// Adds or removes a favorite; returns whether it was added and the resulting list.
    async fn toggle_favorite(
        &self,
        user_id: &str,
        movie_id: &str,
    ) -> anyhow::Result<(bool, Vec<String>)>;

    async fn favorites(&self, user_id: &str) -> anyhow::Result<Vec<String>>;

    async fn touch_user(&self, user_id: &str) -> anyhow::Result<()>;

    async fn count_users(&self) -> anyhow::Result<u64>;
}
