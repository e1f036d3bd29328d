use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bounds of a valid rating value, inclusive
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 10;

/// A single user's rating of a movie
///
/// At most one row exists per (movie, user) pair; re-submission overwrites
/// the value in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Rating {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub value: i32,
    pub created_at: DateTime<Utc>,
}
