use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::AppResult;
use crate::models::{
    Comment, Genre, Movie, NewMovie, Profile, RatedMovie, Rating, Review, User,
};

/// Sort key for movie listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovieSort {
    /// Newest first (creation timestamp descending, id descending on ties)
    #[default]
    CreatedDesc,
    /// Highest aggregate rating first; movies without ratings sort last,
    /// ties break by movie id ascending
    AverageDesc,
}

/// A composable movie query specification
///
/// Predicates, sort and limit are declared here and evaluated by the store,
/// instead of being built up through a fluent query chain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovieQuery {
    /// Exact-match genre predicate
    pub genre: Option<Genre>,
    /// Exact-match release-year predicate
    pub year: Option<i32>,
    /// Keep only movies with at least this many ratings
    pub min_rating_count: Option<i64>,
    pub sort: MovieSort,
    pub limit: Option<usize>,
}

impl MovieQuery {
    /// Newest-first listing, optionally filtered by genre and release year
    pub fn latest(genre: Option<Genre>, year: Option<i32>) -> Self {
        Self {
            genre,
            year,
            ..Self::default()
        }
    }

    /// Top-rated selection: rating count >= 1, best average first
    pub fn top_rated(limit: usize) -> Self {
        Self {
            min_rating_count: Some(1),
            sort: MovieSort::AverageDesc,
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Best-average ordering without the rating-count floor, for the
    /// homepage spotlight where unrated movies may still appear (at the end)
    pub fn featured(limit: usize) -> Self {
        Self {
            sort: MovieSort::AverageDesc,
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// Aggregate rating figures for one movie, as stored (unrounded)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingStats {
    /// Arithmetic mean of all rating values; None when no ratings exist
    pub average: Option<f64>,
    pub count: i64,
}

/// Relational storage over users, profiles, movies, ratings, reviews and
/// comments
///
/// The engines receive this handle explicitly; entities stay plain records
/// with no embedded persistence. Implementations guarantee one rating per
/// (movie, user) with upsert semantics, and cascade deletes (movie ->
/// ratings/reviews -> comments, user -> ratings/reviews/comments/profile,
/// with a deleted user's movies surviving creator-less).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReviewStore: Send + Sync {
    // Users

    async fn create_user(&self, username: &str) -> AppResult<User>;

    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;

    /// Deletes a user and everything they wrote; their movies survive with
    /// a null creator. Returns false if the user did not exist.
    async fn delete_user(&self, id: i64) -> AppResult<bool>;

    // Profiles

    /// Fetches the user's profile, creating an empty one on first access
    async fn get_or_create_profile(&self, user_id: i64) -> AppResult<Profile>;

    async fn update_profile(
        &self,
        user_id: i64,
        bio: Option<String>,
        avatar: Option<String>,
    ) -> AppResult<Profile>;

    // Movies

    async fn insert_movie(&self, new: NewMovie) -> AppResult<Movie>;

    async fn get_movie(&self, id: i64) -> AppResult<Option<Movie>>;

    /// Deletes a movie and cascades to its ratings, reviews and the
    /// reviews' comments. Returns false if the movie did not exist.
    async fn delete_movie(&self, id: i64) -> AppResult<bool>;

    /// Evaluates a movie query specification, annotating every movie with
    /// its live aggregate rating
    async fn list_movies(&self, query: &MovieQuery) -> AppResult<Vec<RatedMovie>>;

    /// Distinct release years with at least one movie, newest first
    async fn release_years(&self) -> AppResult<Vec<i32>>;

    // Ratings

    /// Creates or overwrites the (movie, user) rating row; the bool is
    /// true when a new row was created. Value validation happens upstream.
    async fn upsert_rating(
        &self,
        movie_id: i64,
        user_id: i64,
        value: i32,
    ) -> AppResult<(Rating, bool)>;

    async fn user_rating(&self, movie_id: i64, user_id: i64) -> AppResult<Option<Rating>>;

    async fn ratings_by_user(&self, user_id: i64) -> AppResult<Vec<Rating>>;

    /// All ratings, newest first (API listing)
    async fn list_ratings(&self) -> AppResult<Vec<Rating>>;

    /// Live average and count for one movie, recomputed per call
    async fn rating_stats(&self, movie_id: i64) -> AppResult<RatingStats>;

    // Reviews

    async fn insert_review(
        &self,
        movie_id: i64,
        user_id: i64,
        title: &str,
        body: &str,
    ) -> AppResult<Review>;

    async fn get_review(&self, id: i64) -> AppResult<Option<Review>>;

    async fn update_review(&self, id: i64, title: &str, body: &str)
        -> AppResult<Option<Review>>;

    /// Reviews newest first, across all movies; `limit` of None lists all
    async fn recent_reviews(&self, limit: Option<usize>) -> AppResult<Vec<Review>>;

    async fn reviews_for_movie(&self, movie_id: i64) -> AppResult<Vec<Review>>;

    async fn reviews_by_user(&self, user_id: i64) -> AppResult<Vec<Review>>;

    // Comments

    async fn insert_comment(
        &self,
        review_id: i64,
        user_id: i64,
        body: &str,
    ) -> AppResult<Comment>;

    /// Comments for a review, oldest first
    async fn comments_for_review(&self, review_id: i64) -> AppResult<Vec<Comment>>;

    // Recommendation support

    /// Genres of movies the user rated at or above `min_value`
    async fn favorite_genres(&self, user_id: i64, min_value: i32) -> AppResult<Vec<Genre>>;

    /// Movies in the given genres the user has not rated, annotated with
    /// aggregate ratings, best average first (unrated candidates last)
    async fn unrated_in_genres(
        &self,
        user_id: i64,
        genres: &[Genre],
        limit: usize,
    ) -> AppResult<Vec<RatedMovie>>;
}
