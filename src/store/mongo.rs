use std::collections::BTreeMap;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument, UpdateOptions},
    Collection, Cursor, Database, IndexModel,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::models::{
    booking_model::Booking,
    movie_model::Movie,
    show_model::{SeatLabel, Show},
    user_model::UserFavorites,
};

use super::{Reservation, Store};

// Persisted shapes: same fields as the API models, with timestamps stored as BSON dates
// so range queries and sorting happen in the database.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShowRecord {
    #[serde(rename = "_id")]
    id: String,
    movie: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    show_date_time: DateTime<Utc>,
    show_price: f64,
    #[serde(default)]
    occupied_seats: BTreeMap<SeatLabel, String>,
}

impl From<&Show> for ShowRecord {
    fn from(show: &Show) -> Self {
        ShowRecord {
            id: show.id.clone(),
            movie: show.movie.clone(),
            show_date_time: show.show_date_time,
            show_price: show.show_price,
            occupied_seats: show.occupied_seats.clone(),
        }
    }
}

impl From<ShowRecord> for Show {
    fn from(record: ShowRecord) -> Self {
        Show {
            id: record.id,
            movie: record.movie,
            show_date_time: record.show_date_time,
            show_price: record.show_price,
            occupied_seats: record.occupied_seats,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRecord {
    #[serde(rename = "_id")]
    id: String,
    user: String,
    show: String,
    amount: f64,
    booked_seats: Vec<SeatLabel>,
    is_paid: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingRecord {
    fn from(booking: &Booking) -> Self {
        BookingRecord {
            id: booking.id.clone(),
            user: booking.user.clone(),
            show: booking.show.clone(),
            amount: booking.amount,
            booked_seats: booking.booked_seats.clone(),
            is_paid: booking.is_paid,
            created_at: booking.created_at,
        }
    }
}

impl From<BookingRecord> for Booking {
    fn from(record: BookingRecord) -> Self {
        Booking {
            id: record.id,
            user: record.user,
            show: record.show,
            amount: record.amount,
            booked_seats: record.booked_seats,
            is_paid: record.is_paid,
            created_at: record.created_at,
        }
    }
}

async fn collect<T, U>(mut cursor: Cursor<T>) -> anyhow::Result<Vec<U>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
    U: From<T>,
{
    let mut result = Vec::new();
    while let Some(record) = cursor.try_next().await? {
        result.push(U::from(record));
    }
    Ok(result)
}

fn seat_key(seat: &str) -> String {
    format!("occupiedSeats.{seat}")
}

const RESERVE_ATTEMPTS: usize = 3;
const TOGGLE_ATTEMPTS: usize = 3;

/// Filter and update that claim `seats` only while every one of them is still free.
fn reservation(show_id: &str, seats: &[SeatLabel], booking_id: &str) -> (Document, Document) {
    let mut filter = doc! { "_id": show_id };
    let mut claims = Document::new();
    for seat in seats {
        filter.insert(seat_key(seat), doc! { "$exists": false });
        claims.insert(seat_key(seat), booking_id);
    }
    (filter, doc! { "$set": claims })
}

/// Explains a conditional update that matched nothing, given the show as re-read.
/// `None` means every requested seat is free again and the update should be retried.
fn missed_reservation(show: Option<&Show>, seats: &[SeatLabel]) -> Option<Reservation> {
    let Some(show) = show else {
        return Some(Reservation::ShowMissing);
    };
    let taken: Vec<SeatLabel> = seats
        .iter()
        .filter(|seat| show.occupied_seats.contains_key(*seat))
        .cloned()
        .collect();
    if taken.is_empty() {
        None
    } else {
        Some(Reservation::Conflict(taken))
    }
}

/// Frees `seat` only if `booking_id` still holds it.
fn release(show_id: &str, seat: &str, booking_id: &str) -> (Document, Document) {
    let mut filter = doc! { "_id": show_id };
    filter.insert(seat_key(seat), booking_id);
    let mut unset = Document::new();
    unset.insert(seat_key(seat), "");
    (filter, doc! { "$unset": unset })
}

/// Removes `movie_id` from the user's favorites; matches nothing when it is absent.
fn favorite_removal(user_id: &str, movie_id: &str) -> (Document, Document) {
    (
        doc! { "_id": user_id, "favorites": movie_id },
        doc! { "$pull": { "favorites": movie_id } },
    )
}

/// Appends `movie_id` to the user's favorites; matches nothing when it is present.
fn favorite_addition(user_id: &str, movie_id: &str) -> (Document, Document) {
    (
        doc! { "_id": user_id, "favorites": { "$ne": movie_id } },
        doc! { "$push": { "favorites": movie_id } },
    )
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn movies(&self) -> Collection<Movie> {
        self.db.collection::<Movie>("movies")
    }

    fn shows(&self) -> Collection<ShowRecord> {
        self.db.collection::<ShowRecord>("shows")
    }

    fn bookings(&self) -> Collection<BookingRecord> {
        self.db.collection::<BookingRecord>("bookings")
    }

    fn users(&self) -> Collection<UserFavorites> {
        self.db.collection::<UserFavorites>("users")
    }

    pub async fn ensure_indexes(&self) -> anyhow::Result<()> {
        self.shows()
            .create_indexes(
                vec![
                    IndexModel::builder().keys(doc! { "showDateTime": 1 }).build(),
                    IndexModel::builder()
                        .keys(doc! { "movie": 1, "showDateTime": 1 })
                        .build(),
                ],
                None,
            )
            .await?;
        self.bookings()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user": 1, "createdAt": -1 })
                    .build(),
                None,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn find_movie(&self, id: &str) -> anyhow::Result<Option<Movie>> {
        Ok(self.movies().find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert_movie(&self, movie: &Movie) -> anyhow::Result<Movie> {
        let mut fields: Document = bson::to_document(movie)?;
        fields.remove("_id");

        let options = UpdateOptions::builder().upsert(true).build();
        self.movies()
            .update_one(
                doc! { "_id": movie.id.as_str() },
                doc! { "$setOnInsert": fields },
                options,
            )
            .await?;

        let stored = self.find_movie(&movie.id).await?;
        Ok(stored.unwrap_or_else(|| movie.clone()))
    }

    async fn find_movies(&self, ids: &[String]) -> anyhow::Result<Vec<Movie>> {
        let cursor = self
            .movies()
            .find(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await?;
        collect::<Movie, Movie>(cursor).await
    }

    async fn insert_shows(&self, shows: &[Show]) -> anyhow::Result<()> {
        let records: Vec<ShowRecord> = shows.iter().map(ShowRecord::from).collect();
        self.shows().insert_many(records, None).await?;
        Ok(())
    }

    async fn find_show(&self, id: &str) -> anyhow::Result<Option<Show>> {
        let record = self.shows().find_one(doc! { "_id": id }, None).await?;
        Ok(record.map(Show::from))
    }

    async fn find_shows(&self, ids: &[String]) -> anyhow::Result<Vec<Show>> {
        let cursor = self
            .shows()
            .find(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await?;
        collect(cursor).await
    }

    async fn find_shows_from(
        &self,
        from: DateTime<Utc>,
        movie_id: Option<&str>,
    ) -> anyhow::Result<Vec<Show>> {
        let mut filter = doc! {
            "showDateTime": { "$gte": bson::DateTime::from_chrono(from) },
        };
        if let Some(movie_id) = movie_id {
            filter.insert("movie", movie_id);
        }

        let options = FindOptions::builder()
            .sort(doc! { "showDateTime": 1, "_id": 1 })
            .build();
        let cursor = self.shows().find(filter, options).await?;
        collect(cursor).await
    }

    async fn reserve_seats(
        &self,
        show_id: &str,
        seats: &[SeatLabel],
        booking_id: &str,
    ) -> anyhow::Result<Reservation> {
        for attempt in 1..=RESERVE_ATTEMPTS {
            let (filter, update) = reservation(show_id, seats, booking_id);
            let result = self.shows().update_one(filter, update, None).await?;
            if result.matched_count == 1 {
                return Ok(Reservation::Reserved);
            }

            let show = self.find_show(show_id).await?;
            if let Some(outcome) = missed_reservation(show.as_ref(), seats) {
                return Ok(outcome);
            }
            tracing::debug!(show_id, attempt, "seat reservation raced a release, retrying");
        }

        tracing::warn!(show_id, booking_id, "seat reservation kept missing free seats");
        Ok(Reservation::Conflict(seats.to_vec()))
    }

    async fn release_seats(
        &self,
        show_id: &str,
        seats: &[SeatLabel],
        booking_id: &str,
    ) -> anyhow::Result<()> {
        for seat in seats {
            let (filter, update) = release(show_id, seat, booking_id);
            self.shows().update_one(filter, update, None).await?;
        }
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> anyhow::Result<()> {
        self.bookings()
            .insert_one(BookingRecord::from(booking), None)
            .await?;
        Ok(())
    }

    async fn find_booking(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let record = self.bookings().find_one(doc! { "_id": id }, None).await?;
        Ok(record.map(Booking::from))
    }

    async fn mark_booking_paid(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let record = self
            .bookings()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": { "isPaid": true } }, options)
            .await?;
        Ok(record.map(Booking::from))
    }

    async fn find_bookings(&self, user_id: Option<&str>) -> anyhow::Result<Vec<Booking>> {
        let filter = match user_id {
            Some(user_id) => doc! { "user": user_id },
            None => doc! {},
        };
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let cursor = self.bookings().find(filter, options).await?;
        collect(cursor).await
    }

    async fn toggle_favorite(
        &self,
        user_id: &str,
        movie_id: &str,
    ) -> anyhow::Result<(bool, Vec<String>)> {
        self.touch_user(user_id).await?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        // Each write matches only in the state it expects.
        for _ in 0..TOGGLE_ATTEMPTS {
            let (filter, update) = favorite_removal(user_id, movie_id);
            if let Some(user) = self
                .users()
                .find_one_and_update(filter, update, options.clone())
                .await?
            {
                return Ok((false, user.favorites));
            }

            let (filter, update) = favorite_addition(user_id, movie_id);
            if let Some(user) = self
                .users()
                .find_one_and_update(filter, update, options.clone())
                .await?
            {
                return Ok((true, user.favorites));
            }
        }
        Err(anyhow!("favorite toggle for {user_id} matched no user document"))
    }

    async fn favorites(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        let user = self.users().find_one(doc! { "_id": user_id }, None).await?;
        Ok(user.map(|user| user.favorites).unwrap_or_default())
    }

    async fn touch_user(&self, user_id: &str) -> anyhow::Result<()> {
        let options = UpdateOptions::builder().upsert(true).build();
        self.users()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$setOnInsert": { "favorites": [] } },
                options,
            )
            .await?;
        Ok(())
    }

    async fn count_users(&self) -> anyhow::Result<u64> {
        Ok(self.users().count_documents(doc! {}, None).await?)
    }
}
