use std::collections::HashMap;

use crate::{error::ApiError, models::movie_model::Movie, state::AppState};

/// Adds the movie to the user's favorites, or removes it if already there.
pub async fn toggle_favorite(
    state: &AppState,
    user_id: &str,
    movie_id: &str,
) -> Result<(bool, Vec<String>), ApiError> {
    let movie_id = movie_id.trim();
    if movie_id.is_empty() {
        return Err(ApiError::InvalidRequest("movieId is required".to_string()));
    }

    let (added, favorites) = state.store.toggle_favorite(user_id, movie_id).await?;
    tracing::debug!(user_id, movie_id, added, "favorite toggled");
    Ok((added, favorites))
}

/// Favorite movies that are cached locally, in the order they were added.
pub async fn favorite_movies(state: &AppState, user_id: &str) -> Result<Vec<Movie>, ApiError> {
    let ids = state.store.favorites(user_id).await?;
    let mut movies: HashMap<String, Movie> = state
        .store
        .find_movies(&ids)
        .await?
        .into_iter()
        .map(|movie| (movie.id.clone(), movie))
        .collect();
    Ok(ids.iter().filter_map(|id| movies.remove(id)).collect())
}
