use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::{CurrentUser, OptionalUser};
use crate::db::MovieQuery;
use crate::error::{AppError, AppResult};
use crate::models::{Genre, Movie, NewMovie, RatedMovie, Rating, ReviewWithComments};
use crate::services::aggregation;

use super::AppState;

const TOP_RATED_PAGE_LIMIT: usize = 20;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct MovieListParams {
    pub genre: Option<Genre>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub movies: Vec<RatedMovie>,
    /// Distinct release years, for the filter UI
    pub years: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub title: String,
    pub description: String,
    pub genre: Genre,
    pub release_date: NaiveDate,
    pub director: String,
    pub poster: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieDetailResponse {
    pub movie: RatedMovie,
    pub reviews: Vec<ReviewWithComments>,
    /// The requesting user's own rating, when authenticated and present
    pub user_rating: Option<Rating>,
}

// Handlers

/// Movie listing, newest first, with optional genre and release-year
/// filters
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<MovieListParams>,
) -> AppResult<Json<MovieListResponse>> {
    let store = state.store.as_ref();

    let movies = store
        .list_movies(&MovieQuery::latest(params.genre, params.year))
        .await?;
    let years = store.release_years().await?;

    Ok(Json(MovieListResponse { movies, years }))
}

/// Movie detail: the movie with its live aggregate rating, its reviews
/// (each with comments, oldest first) and the visitor's own rating
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    OptionalUser(user_id): OptionalUser,
) -> AppResult<Json<MovieDetailResponse>> {
    let store = state.store.as_ref();

    let movie = store
        .get_movie(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("movie {} not found", id)))?;
    let movie = aggregation::annotate(store, movie).await?;

    let mut reviews = Vec::new();
    for review in store.reviews_for_movie(id).await? {
        let comments = store.comments_for_review(review.id).await?;
        reviews.push(ReviewWithComments { review, comments });
    }

    let user_rating = match user_id {
        Some(user_id) => store.user_rating(id, user_id).await?,
        None => None,
    };

    Ok(Json(MovieDetailResponse {
        movie,
        reviews,
        user_rating,
    }))
}

/// Adds a movie (login required)
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<CreateMovieRequest>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    for (field, value) in [
        ("title", &request.title),
        ("description", &request.description),
        ("director", &request.director),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} must not be blank", field)));
        }
    }

    let movie = state
        .store
        .insert_movie(NewMovie {
            title: request.title,
            description: request.description,
            genre: request.genre,
            release_date: request.release_date,
            director: request.director,
            poster: request.poster,
            created_by: Some(user_id),
        })
        .await?;

    tracing::info!(movie_id = movie.id, user_id, "Movie added");

    Ok((StatusCode::CREATED, Json(movie)))
}

/// Site-wide top-rated listing (rating count >= 1, best average first)
pub async fn top_rated(State(state): State<AppState>) -> AppResult<Json<Vec<RatedMovie>>> {
    let movies = aggregation::top_rated(state.store.as_ref(), TOP_RATED_PAGE_LIMIT).await?;
    Ok(Json(movies))
}
