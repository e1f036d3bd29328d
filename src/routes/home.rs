use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::OptionalUser;
use crate::db::MovieQuery;
use crate::error::AppResult;
use crate::models::{RatedMovie, Review};
use crate::services::{aggregation, recommendations};
use crate::services::recommendations::Recommendations;

use super::AppState;

const FEATURED_LIMIT: usize = 6;
const TOP_RATED_LIMIT: usize = 10;
const RECENT_REVIEWS_LIMIT: usize = 5;
const RECOMMENDATIONS_LIMIT: usize = 5;

/// Homepage payload
#[derive(Debug, Serialize)]
pub struct HomePage {
    /// Spotlight selection, best average first; unrated movies may appear
    /// at the end
    pub movies: Vec<RatedMovie>,
    pub top_rated: Vec<RatedMovie>,
    pub recent_reviews: Vec<Review>,
    /// Present only for authenticated visitors; `personalized` is false
    /// when the global top-rated list was substituted
    pub recommended: Option<Recommendations>,
}

/// Handler for the homepage
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user_id): OptionalUser,
) -> AppResult<Json<HomePage>> {
    let store = state.store.as_ref();

    let movies = store.list_movies(&MovieQuery::featured(FEATURED_LIMIT)).await?;
    let top_rated = aggregation::top_rated(store, TOP_RATED_LIMIT).await?;
    let recent_reviews = store.recent_reviews(Some(RECENT_REVIEWS_LIMIT)).await?;

    let recommended = match user_id {
        Some(user_id) => {
            Some(recommendations::recommend(store, user_id, RECOMMENDATIONS_LIMIT).await?)
        }
        None => None,
    };

    Ok(Json(HomePage {
        movies,
        top_rated,
        recent_reviews,
        recommended,
    }))
}
