use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::matching::focus::{classify, classify_with_fallback};
use crate::matching::keywords::{extract, extract_enhanced, KeywordSet};
use crate::matching::scorer::{score, ScoreBreakdown};
use crate::postings::models::RawPosting;
use crate::postings::normalize::normalize;
use crate::state::AppState;
use crate::tailoring::models::{TailorOptions, TailoredView};
use crate::tailoring::rerank::tailor_enhanced;
use crate::tailoring::selector::tailor;

#[derive(Deserialize)]
pub struct TailorRequest {
    pub posting: RawPosting,
    /// Overrides classification. Must name a configured focus area.
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Use the LLM capability (with baseline fallback) where it can help.
    #[serde(default)]
    pub enhanced: bool,
}

#[derive(Serialize)]
pub struct TailorResponse {
    pub keywords: KeywordSet,
    pub score: ScoreBreakdown,
    pub view: TailoredView,
}

/// POST /api/v1/tailor
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(req): Json<TailorRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    let posting = normalize(req.posting);
    if posting.title.is_empty() {
        return Err(AppError::Validation("posting.title is required".to_string()));
    }

    let engine = &state.engine;
    let profile = &state.profile.profile;
    let capability = state.capability.as_ref();
    let timeout = engine.llm.timeout();
    let text = posting.searchable_text();

    let requested_focus = req.focus.or_else(|| engine.tailoring.forced_focus.clone());
    if let Some(focus) = &requested_focus {
        if !engine.focus_area_names().any(|name| name == focus.as_str()) {
            return Err(AppError::Validation(format!("Unknown focus area '{focus}'")));
        }
    }

    let (keywords, focus_hint) = if req.enhanced {
        let out = extract_enhanced(
            &text,
            &state.vocabulary,
            &engine.focus_areas,
            capability,
            timeout,
        )
        .await;
        (out.keywords, out.focus_hint)
    } else {
        (extract(&text, &state.vocabulary), None)
    };

    let focus = match requested_focus {
        Some(focus) => Some(focus),
        None if req.enhanced => {
            classify_with_fallback(
                &keywords,
                focus_hint.as_deref(),
                &text,
                &engine.focus_areas,
                capability,
                timeout,
            )
            .await
        }
        None => classify(&keywords, &engine.focus_areas),
    };

    let mut options = TailorOptions::from(&engine.tailoring);
    if let Some(language) = req.language {
        options.language = language;
    }

    let view = if req.enhanced {
        tailor_enhanced(
            profile,
            &posting,
            &keywords,
            focus.as_deref(),
            &options,
            capability,
            timeout,
        )
        .await
    } else {
        tailor(profile, &posting, &keywords, focus.as_deref(), &options)
    };

    info!(
        "Tailored profile for posting {} (focus: {:?}, entries: {})",
        posting.id,
        view.focus,
        view.entries.len()
    );

    Ok(Json(TailorResponse {
        score: score(&posting, &keywords, profile, &engine.scoring),
        keywords,
        view,
    }))
}
