use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user
///
/// Credentials live with the authentication collaborator; this record only
/// carries the identity other rows reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// 1:1 user profile, created lazily on first access
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub bio: Option<String>,
    /// Reference to the avatar image (path or URL); the upload collaborator
    /// owns the bytes
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}
