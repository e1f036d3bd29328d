use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::{Profile, Rating, Review};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub profile: Profile,
    pub reviews: Vec<Review>,
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Shows the visitor's profile (login required), creating it on first
/// access, together with their reviews and ratings
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<ProfilePage>> {
    let store = state.store.as_ref();

    let profile = store.get_or_create_profile(user_id).await?;
    let reviews = store.reviews_by_user(user_id).await?;
    let ratings = store.ratings_by_user(user_id).await?;

    Ok(Json(ProfilePage {
        profile,
        reviews,
        ratings,
    }))
}

/// Updates the visitor's bio and avatar reference
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    let profile = state
        .store
        .update_profile(user_id, request.bio, request.avatar)
        .await?;

    tracing::info!(user_id, "Profile updated");

    Ok(Json(profile))
}
