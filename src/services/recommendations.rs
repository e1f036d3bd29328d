use serde::Serialize;

use crate::db::store::{MovieQuery, ReviewStore};
use crate::error::AppResult;
use crate::models::RatedMovie;

/// A rating at or above this value marks its movie's genre as a favorite.
/// One rule for every call site; the homepage uses it too.
pub const HIGH_RATING_THRESHOLD: i32 = 7;

/// Recommendation set for one user
#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub movies: Vec<RatedMovie>,
    /// False when the user has no ratings and the global top-rated list
    /// was substituted
    pub personalized: bool,
}

/// Produces up to `limit` movies the user has not rated, biased toward
/// genres the user rates highly
///
/// Users without any ratings fall back to the global top-rated list
/// (rating count >= 1). Otherwise favorite genres are derived from the
/// user's ratings at or above [`HIGH_RATING_THRESHOLD`], and unrated
/// movies in those genres are returned best average first. A user who has
/// rated everything in their favorite genres gets an empty list. Purely a
/// read; no writes happen here.
pub async fn recommend(
    store: &dyn ReviewStore,
    user_id: i64,
    limit: usize,
) -> AppResult<Recommendations> {
    let ratings = store.ratings_by_user(user_id).await?;

    if ratings.is_empty() {
        tracing::debug!(user_id, "No ratings, falling back to top rated");
        let movies = store.list_movies(&MovieQuery::top_rated(limit)).await?;
        return Ok(Recommendations {
            movies,
            personalized: false,
        });
    }

    let genres = store
        .favorite_genres(user_id, HIGH_RATING_THRESHOLD)
        .await?;

    if genres.is_empty() {
        // Rated movies, but none highly enough to mark a favorite genre
        return Ok(Recommendations {
            movies: Vec::new(),
            personalized: true,
        });
    }

    let movies = store.unrated_in_genres(user_id, &genres, limit).await?;

    tracing::debug!(
        user_id,
        genre_count = genres.len(),
        recommended = movies.len(),
        "Personalized recommendations computed"
    );

    Ok(Recommendations {
        movies,
        personalized: true,
    })
}
