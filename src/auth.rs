use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the authenticated user id, set by the upstream
/// authentication/session collaborator. Credentials and sessions never
/// reach this service.
pub const USER_ID_HEADER: &str = "x-user-id";

fn user_id_from_parts(parts: &Parts) -> Option<i64> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
}

/// Extractor for login-required handlers
///
/// Rejects with [`AppError::Unauthorized`], which renders as a redirect to
/// the authentication entry point.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id_from_parts(parts)
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Extractor for handlers that serve anonymous visitors too
#[derive(Debug, Clone, Copy)]
pub struct OptionalUser(pub Option<i64>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(user_id_from_parts(parts)))
    }
}
