use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A written review of a movie
///
/// Unlike ratings there is no uniqueness constraint; a user may review the
/// same movie more than once. Title and body are updatable by the author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment on a review; immutable once created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub review_id: i64,
    pub user_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A review together with its comments, oldest comment first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewWithComments {
    #[serde(flatten)]
    pub review: Review,
    pub comments: Vec<Comment>,
}
