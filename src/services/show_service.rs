use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::{
    catalog::ensure_movie,
    error::ApiError,
    models::{
        movie_model::Movie,
        show_model::{MovieShows, Show, ShowDetail, ShowTime},
    },
    notify::Event,
    state::AppState,
    store::Store,
};

/// One calendar date and the start times scheduled on it.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowInput {
    pub date: String,
    pub time: Vec<String>,
}

pub fn parse_show_date_time(date: &str, time: &str) -> Result<DateTime<Utc>, ApiError> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::InvalidRequest(format!("Invalid show date: {date}")))?;
    let time_of_day = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .map_err(|_| ApiError::InvalidRequest(format!("Invalid show time: {time}")))?;
    Ok(day.and_time(time_of_day).and_utc())
}

/// Catalog failures while resolving a movie surface as "not found".
async fn resolve_movie(state: &AppState, movie_id: &str) -> Result<Movie, ApiError> {
    ensure_movie(state.store.as_ref(), state.catalog.as_ref(), movie_id)
        .await
        .map_err(|err| match err {
            ApiError::UpstreamUnavailable(reason) => {
                tracing::warn!(movie_id, %reason, "movie could not be resolved from the catalog");
                ApiError::NotFound("Movie not found".to_string())
            }
            other => other,
        })
}

/// Creates one show per date and time pair; returns the new show ids in input order.
pub async fn create_shows(
    state: &AppState,
    movie_id: &str,
    inputs: &[ShowInput],
    price: f64,
) -> Result<Vec<String>, ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::InvalidRequest(
            "Show price must be a non-negative number".to_string(),
        ));
    }

    let mut date_times = Vec::new();
    for input in inputs {
        for time in &input.time {
            date_times.push(parse_show_date_time(&input.date, time)?);
        }
    }

    let movie = resolve_movie(state, movie_id).await?;

    let shows: Vec<Show> = date_times
        .into_iter()
        .map(|date_time| Show::new(movie.id.clone(), date_time, price))
        .collect();
    if !shows.is_empty() {
        state.store.insert_shows(&shows).await?;
    }
    tracing::info!(movie_id, count = shows.len(), "shows created");

    if let Err(err) = state.notifier.send(Event::show_added(&movie.title)).await {
        tracing::warn!(movie_id, error = %err, "show-added event was not delivered");
    }

    Ok(shows.into_iter().map(|show| show.id).collect())
}

/// Movies with at least one show starting at or after `now`, by earliest show.
pub async fn list_upcoming_shows(
    state: &AppState,
    now: DateTime<Utc>,
) -> Result<Vec<Movie>, ApiError> {
    let shows = state.store.find_shows_from(now, None).await?;

    let mut seen = HashSet::new();
    let movie_ids: Vec<String> = shows
        .into_iter()
        .map(|show| show.movie)
        .filter(|movie_id| seen.insert(movie_id.clone()))
        .collect();

    let mut movies: HashMap<String, Movie> = state
        .store
        .find_movies(&movie_ids)
        .await?
        .into_iter()
        .map(|movie| (movie.id.clone(), movie))
        .collect();

    Ok(movie_ids
        .iter()
        .filter_map(|movie_id| movies.remove(movie_id))
        .collect())
}

pub fn group_by_date(shows: &[Show]) -> BTreeMap<String, Vec<ShowTime>> {
    let mut grouped: BTreeMap<String, Vec<ShowTime>> = BTreeMap::new();
    for show in shows {
        grouped
            .entry(show.show_date_time.format("%Y-%m-%d").to_string())
            .or_default()
            .push(ShowTime {
                time: show.show_date_time,
                show_id: show.id.clone(),
            });
    }
    for times in grouped.values_mut() {
        times.sort_by(|a, b| a.time.cmp(&b.time));
    }
    grouped
}

pub async fn list_shows_for_movie(
    state: &AppState,
    movie_id: &str,
    now: DateTime<Utc>,
) -> Result<MovieShows, ApiError> {
    let movie = resolve_movie(state, movie_id).await?;
    let shows = state.store.find_shows_from(now, Some(&movie.id)).await?;
    tracing::debug!(movie_id, count = shows.len(), "loaded showtimes");

    Ok(MovieShows {
        movie,
        date_time: group_by_date(&shows),
        all_show_times: shows,
    })
}

/// Resolves the movie of each show. A show whose movie document is gone keeps
/// its row with only the movie id filled in.
pub async fn show_details(
    store: &dyn Store,
    shows: Vec<Show>,
) -> Result<Vec<ShowDetail>, ApiError> {
    let mut movie_ids: Vec<String> = shows.iter().map(|show| show.movie.clone()).collect();
    movie_ids.sort();
    movie_ids.dedup();

    let movies: HashMap<String, Movie> = store
        .find_movies(&movie_ids)
        .await?
        .into_iter()
        .map(|movie| (movie.id.clone(), movie))
        .collect();

    Ok(shows
        .into_iter()
        .map(|show| match movies.get(&show.movie) {
            Some(movie) => ShowDetail::new(show, movie.clone()),
            None => {
                tracing::warn!(show_id = %show.id, movie_id = %show.movie, "show references a missing movie");
                let movie = Movie::unresolved(show.movie.clone());
                ShowDetail::new(show, movie)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{movie, test_state};
    use chrono::{Duration, TimeZone};

    #[test]
    fn parses_date_and_time() {
        let parsed = parse_show_date_time("2026-11-02", "18:30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 11, 2, 18, 30, 0).unwrap());
        assert!(parse_show_date_time("2026-11-02", "18:30:15").is_ok());
        assert!(matches!(
            parse_show_date_time("02/11/2026", "18:30"),
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(parse_show_date_time("2026-11-02", "25:00").is_err());
    }

    #[test]
    fn groups_showtimes_by_calendar_date() {
        let day = Utc.with_ymd_and_hms(2026, 11, 2, 0, 0, 0).unwrap();
        let late = Show::new("550", day + Duration::hours(21), 10.0);
        let early = Show::new("550", day + Duration::hours(14), 10.0);
        let next = Show::new("550", day + Duration::days(1) + Duration::hours(9), 10.0);

        let grouped = group_by_date(&[late.clone(), next.clone(), early.clone()]);

        assert_eq!(grouped.len(), 2);
        let first_day = &grouped["2026-11-02"];
        assert_eq!(first_day[0].show_id, early.id);
        assert_eq!(first_day[1].show_id, late.id);
        assert_eq!(grouped["2026-11-03"][0].show_id, next.id);
    }

    #[tokio::test]
    async fn create_shows_caches_movie_and_builds_every_slot() {
        let (state, catalog) = test_state(vec![movie("550", "Fight Club")]);
        let inputs = vec![
            ShowInput {
                date: "2099-01-01".into(),
                time: vec!["10:00".into(), "20:00".into()],
            },
            ShowInput {
                date: "2099-01-02".into(),
                time: vec!["12:00".into()],
            },
        ];

        let ids = create_shows(&state, "550", &inputs, 12.0).await.unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(catalog.fetch_count(), 1);
        let stored = state.store.find_shows(&ids).await.unwrap();
        assert!(stored.iter().all(|show| show.occupied_seats.is_empty()));
        assert!(stored.iter().all(|show| show.show_price == 12.0));
    }

    #[tokio::test]
    async fn create_shows_fails_before_writing_when_movie_is_unknown() {
        let (state, _) = test_state(Vec::new());
        let inputs = vec![ShowInput {
            date: "2099-01-01".into(),
            time: vec!["10:00".into()],
        }];

        let err = create_shows(&state, "404", &inputs, 12.0).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(state
            .store
            .find_shows_from(Utc::now(), None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let (state, _) = test_state(vec![movie("550", "Fight Club")]);
        let err = create_shows(&state, "550", &[], -1.0).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn upcoming_shows_are_future_and_unique() {
        let (state, _) = test_state(vec![movie("1", "One"), movie("2", "Two")]);
        let now = Utc::now();
        state.store.insert_movie(&movie("1", "One")).await.unwrap();
        state.store.insert_movie(&movie("2", "Two")).await.unwrap();
        state.store.insert_movie(&movie("3", "Past")).await.unwrap();
        state
            .store
            .insert_shows(&[
                Show::new("2", now + Duration::hours(5), 10.0),
                Show::new("1", now + Duration::hours(1), 10.0),
                Show::new("1", now + Duration::hours(9), 10.0),
                Show::new("3", now - Duration::hours(1), 10.0),
            ])
            .await
            .unwrap();

        let movies = list_upcoming_shows(&state, now).await.unwrap();
        let ids: Vec<&str> = movies.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
