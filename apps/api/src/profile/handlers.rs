use axum::{extract::State, Json};
use serde::Serialize;

use crate::profile::validation::ValidationIssue;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProfileIssuesResponse {
    pub entries: usize,
    pub issues: Vec<ValidationIssue>,
}

/// GET /api/v1/profile/issues
/// Units skipped while loading the profile directory.
pub async fn handle_profile_issues(State(state): State<AppState>) -> Json<ProfileIssuesResponse> {
    Json(ProfileIssuesResponse {
        entries: state.profile.profile.entries.len(),
        issues: state.profile.issues.clone(),
    })
}
