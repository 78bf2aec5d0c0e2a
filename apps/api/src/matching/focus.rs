//! Focus Classifier: zero or one focus area per posting.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::FocusArea;
use crate::llm_client::fallback::enhanced_or;
use crate::llm_client::{complete_as, Capability};
use crate::matching::keywords::KeywordSet;
use crate::matching::prompts::{focus_prompt, FOCUS_SYSTEM};
use crate::postings::normalize::normalize_text;

#[derive(Debug, Deserialize)]
struct FocusReply {
    #[serde(default)]
    focus_area: Option<String>,
}

/// Number of an area's indicators present in the keyword set.
fn indicator_hits(area: &FocusArea, keywords: &KeywordSet) -> usize {
    area.indicators
        .iter()
        .filter(|indicator| keywords.contains(indicator))
        .count()
}

/// The area with strictly the most indicator hits. Ties and zero hits give `None`.
pub fn classify(keywords: &KeywordSet, focus_areas: &[FocusArea]) -> Option<String> {
    let mut best: Option<(&FocusArea, usize)> = None;
    let mut tied = false;

    for area in focus_areas {
        let hits = indicator_hits(area, keywords);
        match best {
            Some((_, top)) if hits == top => tied = true,
            Some((_, top)) if hits < top => {}
            _ => {
                best = Some((area, hits));
                tied = false;
            }
        }
    }

    match best {
        Some((area, hits)) if hits > 0 && !tied => Some(area.name.clone()),
        _ => None,
    }
}

/// Maps a capability answer onto a configured area name, if it is one.
fn accept_label(label: &str, focus_areas: &[FocusArea]) -> Option<String> {
    let label = normalize_text(label);
    focus_areas
        .iter()
        .find(|a| normalize_text(&a.name) == label)
        .map(|a| a.name.clone())
}

/// Keyword classification first. When that is inconclusive, `hint` (the
/// focus answer from enhanced keyword extraction) is used if it names a
/// configured area; only then is the capability asked. Labels outside the
/// configured areas are discarded.
pub async fn classify_with_fallback(
    keywords: &KeywordSet,
    hint: Option<&str>,
    text: &str,
    focus_areas: &[FocusArea],
    capability: &dyn Capability,
    timeout: Duration,
) -> Option<String> {
    if let Some(focus) = classify(keywords, focus_areas) {
        return Some(focus);
    }
    if focus_areas.is_empty() {
        return None;
    }
    if let Some(hint) = hint {
        match accept_label(hint, focus_areas) {
            Some(focus) => return Some(focus),
            None => debug!("Ignoring unknown focus hint '{hint}'"),
        }
    }

    let names: Vec<&str> = focus_areas.iter().map(|a| a.name.as_str()).collect();
    let prompt = focus_prompt(text, &names);
    let reply = enhanced_or(capability, timeout, "focus classification", || {
        complete_as::<FocusReply>(capability, &prompt, FOCUS_SYSTEM)
    })
    .await?;

    let label = reply.focus_area?;
    let accepted = accept_label(&label, focus_areas);
    if accepted.is_none() {
        debug!("Discarding unknown focus label '{label}' from capability");
    }
    accepted
}
