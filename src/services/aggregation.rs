use crate::db::store::{MovieQuery, ReviewStore};
use crate::error::AppResult;
use crate::models::{Movie, RatedMovie};

/// Rounds a stored average to one decimal place
///
/// No ratings (None) maps to the 0.0 sentinel, which cannot collide with a
/// real score: the minimum submittable rating is 1.
pub fn round_rating(average: Option<f64>) -> f64 {
    match average {
        Some(avg) => (avg * 10.0).round() / 10.0,
        None => 0.0,
    }
}

/// Annotates one movie with its live aggregate rating
///
/// Recomputed from the current rating rows on every call; nothing is
/// cached or denormalized, so the figure is always consistent with the
/// underlying data.
pub async fn annotate(store: &dyn ReviewStore, movie: Movie) -> AppResult<RatedMovie> {
    let stats = store.rating_stats(movie.id).await?;
    Ok(RatedMovie {
        movie,
        average_rating: round_rating(stats.average),
        rating_count: stats.count,
    })
}

/// Global top-rated selection: movies with at least one rating, best
/// average first, ties broken by movie id ascending
pub async fn top_rated(store: &dyn ReviewStore, limit: usize) -> AppResult<Vec<RatedMovie>> {
    store.list_movies(&MovieQuery::top_rated(limit)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::{MockReviewStore, RatingStats};
    use crate::models::Genre;
    use chrono::{NaiveDate, Utc};

    fn test_movie(id: i64) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            description: "A test movie".to_string(),
            genre: Genre::Drama,
            release_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            director: "Jane Doe".to_string(),
            poster: None,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    #[test]
    fn test_round_rating_no_ratings_is_sentinel_zero() {
        assert_eq!(round_rating(None), 0.0);
    }

    #[test]
    fn test_round_rating_one_decimal() {
        // mean of [8, 6, 10]
        assert_eq!(round_rating(Some(8.0)), 8.0);
        // mean of [7, 8]
        assert_eq!(round_rating(Some(7.5)), 7.5);
        // mean of [7, 7, 8]
        assert_eq!(round_rating(Some(22.0 / 3.0)), 7.3);
        // mean of [5, 6, 6]
        assert_eq!(round_rating(Some(17.0 / 3.0)), 5.7);
    }

    #[test]
    fn test_round_rating_sentinel_below_any_real_score() {
        assert!(round_rating(None) < round_rating(Some(1.0)));
    }

    #[test]
    fn test_annotate_rounds_live_stats() {
        let mut store = MockReviewStore::new();
        store
            .expect_rating_stats()
            .withf(|movie_id| *movie_id == 7)
            .returning(|_| {
                Ok(RatingStats {
                    average: Some(25.0 / 3.0),
                    count: 3,
                })
            });

        let rated = tokio_test::block_on(annotate(&store, test_movie(7))).unwrap();
        assert_eq!(rated.average_rating, 8.3);
        assert_eq!(rated.rating_count, 3);
    }

    #[test]
    fn test_annotate_unrated_movie() {
        let mut store = MockReviewStore::new();
        store
            .expect_rating_stats()
            .returning(|_| Ok(RatingStats::default()));

        let rated = tokio_test::block_on(annotate(&store, test_movie(1))).unwrap();
        assert_eq!(rated.average_rating, 0.0);
        assert_eq!(rated.rating_count, 0);
    }

    #[test]
    fn test_top_rated_uses_count_floor_and_limit() {
        let mut store = MockReviewStore::new();
        store
            .expect_list_movies()
            .withf(|query| {
                query.min_rating_count == Some(1)
                    && query.limit == Some(20)
                    && query.sort == crate::db::store::MovieSort::AverageDesc
            })
            .returning(|_| Ok(vec![]));

        let movies = tokio_test::block_on(top_rated(&store, 20)).unwrap();
        assert!(movies.is_empty());
    }
}
