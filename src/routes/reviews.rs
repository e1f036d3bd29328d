use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{Comment, Review};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

fn validate_review(request: &ReviewRequest) -> AppResult<()> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be blank".to_string()));
    }
    if request.body.trim().is_empty() {
        return Err(AppError::Validation("body must not be blank".to_string()));
    }
    Ok(())
}

/// Posts a review for a movie (login required)
pub async fn create(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<ReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    validate_review(&request)?;

    let store = state.store.as_ref();
    store
        .get_movie(movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("movie {} not found", movie_id)))?;

    let review = store
        .insert_review(movie_id, user_id, &request.title, &request.body)
        .await?;

    tracing::info!(review_id = review.id, movie_id, user_id, "Review posted");

    Ok((StatusCode::CREATED, Json(review)))
}

/// Updates a review's title and body; only the author may edit
pub async fn update(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<ReviewRequest>,
) -> AppResult<Json<Review>> {
    validate_review(&request)?;

    let store = state.store.as_ref();
    let existing = store
        .get_review(review_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {} not found", review_id)))?;

    if existing.user_id != user_id {
        return Err(AppError::Forbidden(
            "only the author may edit a review".to_string(),
        ));
    }

    let review = store
        .update_review(review_id, &request.title, &request.body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {} not found", review_id)))?;

    Ok(Json(review))
}

/// Adds a comment to a review (login required); comments are immutable
/// once created
pub async fn comment(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    if request.body.trim().is_empty() {
        return Err(AppError::Validation("body must not be blank".to_string()));
    }

    let store = state.store.as_ref();
    store
        .get_review(review_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {} not found", review_id)))?;

    let comment = store
        .insert_comment(review_id, user_id, &request.body)
        .await?;

    tracing::info!(comment_id = comment.id, review_id, user_id, "Comment added");

    Ok((StatusCode::CREATED, Json(comment)))
}
