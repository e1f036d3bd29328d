use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::ReviewStore;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

pub mod api;
pub mod home;
pub mod movies;
pub mod profiles;
pub mod ratings;
pub mod recommendations;
pub mod reviews;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReviewStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Pages
        .route("/", get(home::index))
        .route("/movies", get(movies::list).post(movies::create))
        .route("/movies/:id", get(movies::detail))
        .route("/top-rated", get(movies::top_rated))
        .route("/recommendations", get(recommendations::list))
        .route("/profile", get(profiles::show).put(profiles::update))
        // Ratings, reviews and comments
        .route("/movies/:id/rate", post(ratings::rate))
        .route("/movies/:id/reviews", post(reviews::create))
        .route("/reviews/:id", put(reviews::update))
        .route("/reviews/:id/comments", post(reviews::comment))
        // JSON API mirror
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(api::movie_list))
        .route("/movies/:id", get(api::movie_detail))
        .route("/ratings", get(api::rating_list))
        .route("/reviews", get(api::review_list))
        .route("/top-rated", get(api::top_rated))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
