// Prompt constants for bullet re-ranking.

use crate::llm_client::prompts::{truncate_chars, JSON_ONLY_SYSTEM, MAX_PROMPT_DESCRIPTION_CHARS};
use crate::postings::models::Posting;
use crate::tailoring::selector::Candidate;

pub const RERANK_SYSTEM: &str = JSON_ONLY_SYSTEM;

/// Re-rank prompt. Replace `{title}`, `{description}`, `{count}` and `{bullets}`.
pub const RERANK_PROMPT_TEMPLATE: &str = r#"Order these resume bullets from most to least relevant for the job below.

Job title: {title}
Job description:
{description}

Bullets (0-based index: text):
{bullets}

Return a JSON object: {"order": [<indices>]}
The order MUST contain each index from 0 to {count} minus one exactly once.
Do NOT rewrite, add or drop bullets."#;

pub fn rerank_prompt(posting: &Posting, candidates: &[Candidate<'_>]) -> String {
    let bullets = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{i}: {}", c.bullet.text))
        .collect::<Vec<_>>()
        .join("\n");
    RERANK_PROMPT_TEMPLATE
        .replace("{title}", &posting.title)
        .replace(
            "{description}",
            truncate_chars(&posting.description, MAX_PROMPT_DESCRIPTION_CHARS),
        )
        .replace("{count}", &candidates.len().to_string())
        .replace("{bullets}", &bullets)
}
