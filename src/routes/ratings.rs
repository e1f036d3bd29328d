use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::middleware::request_id::RequestId;
use crate::services::ratings::{self, RatingOutcome};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i32,
}

/// Handler for rating submission (login required)
///
/// 201 when a new rating row was created, 200 when an existing one was
/// overwritten.
pub async fn rate(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Extension(request_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<RateRequest>,
) -> AppResult<(StatusCode, Json<RatingOutcome>)> {
    tracing::info!(
        request_id = %request_id,
        movie_id,
        user_id,
        value = request.rating,
        "Processing rating submission"
    );

    let outcome =
        ratings::submit_rating(state.store.as_ref(), movie_id, user_id, request.rating).await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome)))
}
