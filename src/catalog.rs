//! Movie catalog gateway: TMDB access plus the lazy local movie cache.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    error::ApiError,
    models::movie_model::{CastMember, Genre, Movie, MovieSummary},
    store::Store,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn now_playing(&self) -> Result<Vec<MovieSummary>, ApiError>;

    /// Full movie record (details and credits) for a catalog id.
    async fn movie_details(&self, movie_id: &str) -> Result<Movie, ApiError>;
}

#[derive(Deserialize)]
struct NowPlayingPage {
    results: Vec<MovieSummary>,
}

#[derive(Deserialize)]
struct TmdbMovie {
    title: String,
    #[serde(default)]
    overview: String,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    release_date: Option<String>,
    original_language: Option<String>,
    tagline: Option<String>,
    #[serde(default)]
    vote_average: f64,
    runtime: Option<i64>,
}

#[derive(Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Deserialize)]
struct TmdbErrorBody {
    status_message: Option<String>,
}

#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(TmdbClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<TmdbErrorBody>()
                .await
                .ok()
                .and_then(|body| body.status_message)
                .unwrap_or_else(|| format!("movie catalog responded with {status}"));
            tracing::warn!(%status, path, %message, "movie catalog request failed");
            return Err(ApiError::UpstreamUnavailable(message));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn now_playing(&self) -> Result<Vec<MovieSummary>, ApiError> {
        let page: NowPlayingPage = self.get("/movie/now_playing").await?;
        Ok(page.results)
    }

    async fn movie_details(&self, movie_id: &str) -> Result<Movie, ApiError> {
        let details_path = format!("/movie/{movie_id}");
        let credits_path = format!("/movie/{movie_id}/credits");
        let (details, credits) = futures::try_join!(
            self.get::<TmdbMovie>(&details_path),
            self.get::<TmdbCredits>(&credits_path),
        )?;

        Ok(Movie {
            id: movie_id.to_string(),
            title: details.title,
            overview: details.overview,
            poster_path: details.poster_path,
            backdrop_path: details.backdrop_path,
            genres: details.genres,
            casts: credits.cast,
            release_date: details.release_date,
            original_language: details.original_language,
            tagline: details.tagline.unwrap_or_default(),
            vote_average: details.vote_average,
            runtime: details.runtime,
        })
    }
}

/// In-memory catalog that counts detail fetches. Used for offline runs and tests.
#[derive(Default)]
pub struct StaticCatalog {
    movies: HashMap<String, Movie>,
    now_playing: Vec<MovieSummary>,
    fetches: AtomicUsize,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movie(mut self, movie: Movie) -> Self {
        self.movies.insert(movie.id.clone(), movie);
        self
    }

    pub fn with_now_playing(mut self, movies: Vec<MovieSummary>) -> Self {
        self.now_playing = movies;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MovieCatalog for StaticCatalog {
    async fn now_playing(&self) -> Result<Vec<MovieSummary>, ApiError> {
        Ok(self.now_playing.clone())
    }

    async fn movie_details(&self, movie_id: &str) -> Result<Movie, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.movies
            .get(movie_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::UpstreamUnavailable("The resource you requested could not be found.".into())
            })
    }
}

pub async fn fetch_now_playing(catalog: &dyn MovieCatalog) -> Result<Vec<MovieSummary>, ApiError> {
    catalog.now_playing().await
}

/// Returns the cached movie, fetching and persisting it on first reference.
pub async fn ensure_movie(
    store: &dyn Store,
    catalog: &dyn MovieCatalog,
    movie_id: &str,
) -> Result<Movie, ApiError> {
    if let Some(movie) = store.find_movie(movie_id).await? {
        return Ok(movie);
    }

    let movie = catalog.movie_details(movie_id).await?;
    let stored = store.insert_movie(&movie).await?;
    tracing::info!(movie_id, title = %stored.title, "cached movie from catalog");
    Ok(stored)
}
