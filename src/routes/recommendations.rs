use axum::{extract::State, Json};

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::recommendations::{self, Recommendations};

use super::AppState;

const RECOMMENDATIONS_LIMIT: usize = 10;

/// Handler for the recommendations endpoint (login required)
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<Recommendations>> {
    let recommendations =
        recommendations::recommend(state.store.as_ref(), user_id, RECOMMENDATIONS_LIMIT).await?;
    Ok(Json(recommendations))
}
