use std::sync::Arc;

use crate::{
    auth::StaticAuthenticator,
    catalog::StaticCatalog,
    models::movie_model::Movie,
    notify::LogNotifier,
    state::AppState,
    store::MemoryStore,
};

pub fn movie(id: &str, title: &str) -> Movie {
    Movie {
        id: id.to_string(),
        title: title.to_string(),
        overview: String::new(),
        poster_path: None,
        backdrop_path: None,
        genres: Vec::new(),
        casts: Vec::new(),
        release_date: None,
        original_language: Some("en".to_string()),
        tagline: String::new(),
        vote_average: 7.5,
        runtime: Some(120),
    }
}

pub fn test_state(movies: Vec<Movie>) -> (AppState, Arc<StaticCatalog>) {
    let catalog = Arc::new(
        movies
            .into_iter()
            .fold(StaticCatalog::new(), |catalog, movie| catalog.with_movie(movie)),
    );
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        catalog.clone(),
        Arc::new(StaticAuthenticator::new()),
        Arc::new(LogNotifier),
    );
    (state, catalog)
}
