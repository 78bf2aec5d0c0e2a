// Prompt constants for keyword extraction and focus classification.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{truncate_chars, JSON_ONLY_SYSTEM, MAX_PROMPT_DESCRIPTION_CHARS};

/// System prompt for keyword extraction.
pub const KEYWORD_SYSTEM: &str = JSON_ONLY_SYSTEM;

/// Keyword extraction prompt. Replace `{areas}` and `{posting_text}`.
pub const KEYWORD_PROMPT_TEMPLATE: &str = r#"Extract the technical keywords and skills from this job posting.

Return a JSON object with this EXACT schema:
{
  "keywords": ["python", "docker"],
  "required_skills": ["python"],
  "nice_to_have_skills": ["kubernetes"],
  "focus_area": "<one of the allowed focus areas, or null>"
}

Rules:
- Use lowercase, canonical technology names ("pytorch", not "PyTorch framework").
- required_skills: explicit must-haves ("required", "must have", minimum years).
- nice_to_have_skills: phrases like "preferred", "bonus", "a plus".
- keywords: every other relevant technology, method or domain term.
- focus_area: the primary focus of the role, or null if none clearly applies.

Allowed focus areas:
{areas}

Job posting:
{posting_text}"#;

/// System prompt for focus classification.
pub const FOCUS_SYSTEM: &str = JSON_ONLY_SYSTEM;

/// Focus classification prompt. Replace `{areas}` and `{posting_text}`.
pub const FOCUS_PROMPT_TEMPLATE: &str = r#"Classify the primary focus of this job posting.

Allowed focus areas (pick exactly one, or null if none clearly applies):
{areas}

Return a JSON object: {"focus_area": "<one of the allowed names or null>"}

Job posting:
{posting_text}"#;

fn area_list(areas: &[&str]) -> String {
    areas
        .iter()
        .map(|a| format!("- {a}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn keyword_prompt(text: &str, areas: &[&str]) -> String {
    KEYWORD_PROMPT_TEMPLATE
        .replace("{areas}", &area_list(areas))
        .replace(
            "{posting_text}",
            truncate_chars(text, MAX_PROMPT_DESCRIPTION_CHARS),
        )
}

pub fn focus_prompt(text: &str, areas: &[&str]) -> String {
    FOCUS_PROMPT_TEMPLATE
        .replace("{areas}", &area_list(areas))
        .replace(
            "{posting_text}",
            truncate_chars(text, MAX_PROMPT_DESCRIPTION_CHARS),
        )
}
