// Prompt fragments shared by every capability call site. The prompts for a
// specific operation live next to it (matching/prompts.rs, tailoring/prompts.rs).

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Longest slice of a posting description ever sent to a provider.
pub const MAX_PROMPT_DESCRIPTION_CHARS: usize = 3000;

/// Truncates on a char boundary to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
