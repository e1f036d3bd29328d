use serde::Serialize;

use crate::db::store::ReviewStore;
use crate::error::{AppError, AppResult};
use crate::models::rating::{MAX_RATING, MIN_RATING};
use crate::models::Rating;

/// Result of a rating submission
#[derive(Debug, Clone, Serialize)]
pub struct RatingOutcome {
    pub rating: Rating,
    /// True when a new row was created, false when an existing rating was
    /// overwritten
    pub created: bool,
}

/// Validated rating upsert
///
/// Rejects values outside [1, 10] before the store is touched, 404s on a
/// missing movie, then creates or overwrites the (movie, user) row via the
/// store's unique-constraint upsert.
pub async fn submit_rating(
    store: &dyn ReviewStore,
    movie_id: i64,
    user_id: i64,
    value: i32,
) -> AppResult<RatingOutcome> {
    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(AppError::Validation(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }

    let movie = store
        .get_movie(movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("movie {} not found", movie_id)))?;

    let (rating, created) = store.upsert_rating(movie.id, user_id, value).await?;

    tracing::info!(
        movie_id,
        user_id,
        value,
        created,
        "Rating saved"
    );

    Ok(RatingOutcome { rating, created })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockReviewStore;
    use crate::models::{Genre, Movie};
    use chrono::{NaiveDate, Utc};

    fn test_movie(id: i64) -> Movie {
        Movie {
            id,
            title: "Heat".to_string(),
            description: String::new(),
            genre: Genre::Thriller,
            release_date: NaiveDate::from_ymd_opt(1995, 12, 15).unwrap(),
            director: "Michael Mann".to_string(),
            poster: None,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    fn test_row(movie_id: i64, user_id: i64, value: i32) -> Rating {
        Rating {
            id: 1,
            movie_id,
            user_id,
            value,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_value_zero_rejected_before_store() {
        // No expectations set: any store call would panic
        let store = MockReviewStore::new();
        let result = tokio_test::block_on(submit_rating(&store, 1, 1, 0));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_value_eleven_rejected_before_store() {
        let store = MockReviewStore::new();
        let result = tokio_test::block_on(submit_rating(&store, 1, 1, 11));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_missing_movie_is_not_found() {
        let mut store = MockReviewStore::new();
        store.expect_get_movie().returning(|_| Ok(None));

        let result = tokio_test::block_on(submit_rating(&store, 99, 1, 5));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_first_submission_creates() {
        let mut store = MockReviewStore::new();
        store
            .expect_get_movie()
            .returning(|id| Ok(Some(test_movie(id))));
        store
            .expect_upsert_rating()
            .withf(|movie_id, user_id, value| *movie_id == 5 && *user_id == 2 && *value == 9)
            .returning(|movie_id, user_id, value| Ok((test_row(movie_id, user_id, value), true)));

        let outcome = tokio_test::block_on(submit_rating(&store, 5, 2, 9)).unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.rating.value, 9);
    }

    #[test]
    fn test_resubmission_overwrites() {
        let mut store = MockReviewStore::new();
        store
            .expect_get_movie()
            .returning(|id| Ok(Some(test_movie(id))));
        store
            .expect_upsert_rating()
            .returning(|movie_id, user_id, value| Ok((test_row(movie_id, user_id, value), false)));

        let outcome = tokio_test::block_on(submit_rating(&store, 5, 2, 9)).unwrap();
        assert!(!outcome.created);
        assert_eq!(outcome.rating.value, 9);
    }

    #[test]
    fn test_boundary_values_accepted() {
        for value in [MIN_RATING, MAX_RATING] {
            let mut store = MockReviewStore::new();
            store
                .expect_get_movie()
                .returning(|id| Ok(Some(test_movie(id))));
            store
                .expect_upsert_rating()
                .returning(|movie_id, user_id, value| {
                    Ok((test_row(movie_id, user_id, value), true))
                });

            let outcome = tokio_test::block_on(submit_rating(&store, 1, 1, value)).unwrap();
            assert_eq!(outcome.rating.value, value);
        }
    }
}
