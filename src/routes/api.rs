//! JSON API mirror of the movie, rating and review listings

use axum::{
    extract::{Path, State},
    Json,
};

use crate::db::MovieQuery;
use crate::error::{AppError, AppResult};
use crate::models::{RatedMovie, Rating, Review};
use crate::services::aggregation;

use super::AppState;

const TOP_RATED_API_LIMIT: usize = 10;

/// All movies, newest first, annotated with aggregate ratings
pub async fn movie_list(State(state): State<AppState>) -> AppResult<Json<Vec<RatedMovie>>> {
    let movies = state
        .store
        .list_movies(&MovieQuery::latest(None, None))
        .await?;
    Ok(Json(movies))
}

/// One movie with its aggregate rating
pub async fn movie_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RatedMovie>> {
    let store = state.store.as_ref();
    let movie = store
        .get_movie(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("movie {} not found", id)))?;
    let movie = aggregation::annotate(store, movie).await?;
    Ok(Json(movie))
}

/// All ratings, newest first
pub async fn rating_list(State(state): State<AppState>) -> AppResult<Json<Vec<Rating>>> {
    let ratings = state.store.list_ratings().await?;
    Ok(Json(ratings))
}

/// All reviews, newest first
pub async fn review_list(State(state): State<AppState>) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.store.recent_reviews(None).await?;
    Ok(Json(reviews))
}

/// Top-rated movies for API consumers
pub async fn top_rated(State(state): State<AppState>) -> AppResult<Json<Vec<RatedMovie>>> {
    let movies = aggregation::top_rated(state.store.as_ref(), TOP_RATED_API_LIMIT).await?;
    Ok(Json(movies))
}
