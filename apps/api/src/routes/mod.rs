pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::postings::handlers as postings;
use crate::profile::handlers as profile;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Postings
        .route("/api/v1/postings/dedup", post(postings::handle_dedup))
        .route("/api/v1/postings/merge", post(postings::handle_merge))
        .route("/api/v1/postings/score", post(postings::handle_score))
        // Tailoring
        .route("/api/v1/tailor", post(tailoring::handle_tailor))
        // Profile
        .route(
            "/api/v1/profile/issues",
            get(profile::handle_profile_issues),
        )
        .fallback(not_found)
        .with_state(state)
}
