use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::scorer::{score_batch, InterestLevel, SkippedPosting};
use crate::postings::dedup::{deduplicate, merge, DedupOutcome};
use crate::postings::models::{Posting, RawPosting};
use crate::postings::normalize::normalize;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PostingBatchRequest {
    pub postings: Vec<RawPosting>,
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub postings: Vec<RawPosting>,
    /// Fold duplicates before scoring.
    #[serde(default = "default_true")]
    pub dedup: bool,
}

#[derive(Deserialize)]
pub struct MergeRequest {
    pub existing: Posting,
    pub incoming: Posting,
}

#[derive(Serialize)]
pub struct ScoredPosting {
    pub posting: Posting,
    pub interest: InterestLevel,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    /// Highest total first.
    pub scored: Vec<ScoredPosting>,
    pub skipped: Vec<SkippedPosting>,
    pub merged: usize,
}

fn default_true() -> bool {
    true
}

/// POST /api/v1/postings/dedup
pub async fn handle_dedup(Json(req): Json<PostingBatchRequest>) -> Json<DedupOutcome> {
    let postings = req.postings.into_iter().map(normalize).collect();
    Json(deduplicate(postings))
}

/// POST /api/v1/postings/merge
pub async fn handle_merge(Json(req): Json<MergeRequest>) -> Result<Json<Posting>, AppError> {
    Ok(Json(merge(&req.existing, &req.incoming)?))
}

/// POST /api/v1/postings/score
pub async fn handle_score(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Json<ScoreResponse> {
    let postings: Vec<Posting> = req.postings.into_iter().map(normalize).collect();
    let (postings, merged) = if req.dedup {
        let outcome = deduplicate(postings);
        (outcome.postings, outcome.merged)
    } else {
        (postings, 0)
    };

    let scoring = &state.engine.scoring;
    let outcome = score_batch(
        postings,
        &state.profile.profile,
        &state.vocabulary,
        scoring,
    );

    let mut scored: Vec<ScoredPosting> = outcome
        .scored
        .into_iter()
        .map(|posting| {
            let total = posting.score.as_ref().map_or(0.0, |s| s.total);
            ScoredPosting {
                interest: InterestLevel::classify(total, &scoring.thresholds),
                posting,
            }
        })
        .collect();
    scored.sort_by(|a, b| {
        let total = |p: &ScoredPosting| p.posting.score.as_ref().map_or(0.0, |s| s.total);
        total(b)
            .partial_cmp(&total(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Json(ScoreResponse {
        scored,
        skipped: outcome.skipped,
        merged,
    })
}
