//! Normalizer: maps raw collector records onto `Posting` and derives the dedup key.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::postings::models::{CanonicalFields, Posting, RawPosting};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Gender markers like "(m/f/d)", "(h/m)", "(f/m/x)".
static GENDER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\(\s*[a-z]\s*(?:/\s*[a-z]\s*)+\)").expect("gender marker regex")
});

/// Attention-grabbing prefixes like "URGENT:" or "Hiring -".
static TITLE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:urgent|hiring|new)\s*[:!\-–]+\s*").expect("title prefix regex")
});

const COMPANY_SUFFIXES: &[&str] = &[
    " inc", " inc.", " ltd", " ltd.", " llc", " corp", " corp.", " s.a.", " s.l.", " gmbh",
    " plc",
];

/// Trims and collapses internal whitespace, keeping case.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Lowercases, trims and collapses whitespace.
pub fn normalize_text(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase())
}

pub fn normalize_company(company: &str) -> String {
    let mut company = normalize_text(company);
    loop {
        let before = company.len();
        company = company.trim_end_matches([',', ' ']).to_string();
        for suffix in COMPANY_SUFFIXES {
            if let Some(stripped) = company.strip_suffix(suffix) {
                company = stripped.to_string();
                break;
            }
        }
        if company.len() == before {
            break;
        }
    }
    company.trim().to_string()
}

pub fn normalize_title(title: &str) -> String {
    let title = GENDER_MARKER.replace_all(title, " ");
    let title = TITLE_PREFIX.replace(&title, "");
    normalize_text(&title)
}

pub fn normalize_location(location: &str) -> String {
    normalize_text(location)
}

/// Stable hex SHA-256 of the canonical (company, title, location) triple.
pub fn canonical_key(company: &str, title: &str, location: &str) -> String {
    let raw = format!("{company}|{title}|{location}");
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// Canonical forms and dedup key derived from display fields.
pub fn canonical_fields(company: &str, title: &str, location: &str) -> CanonicalFields {
    let company = normalize_company(company);
    let title = normalize_title(title);
    let location = normalize_location(location);
    let dedup_key = canonical_key(&company, &title, &location);
    CanonicalFields {
        company,
        title,
        location,
        dedup_key,
    }
}

/// Recomputes the dedup key from a posting's display fields.
pub fn dedup_key(posting: &Posting) -> String {
    canonical_fields(&posting.company, &posting.title, &posting.location).dedup_key
}

/// Parses RFC 3339, `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn normalize(raw: RawPosting) -> Posting {
    normalize_at(raw, Utc::now())
}

/// Normalizes `raw`, using `collected_at` when the record carries no collection time.
pub fn normalize_at(raw: RawPosting, collected_at: DateTime<Utc>) -> Posting {
    let title = collapse_whitespace(raw.title.as_deref().unwrap_or_default());
    let company = collapse_whitespace(raw.company.as_deref().unwrap_or_default());
    let location = collapse_whitespace(raw.location.as_deref().unwrap_or_default());

    let canonical = canonical_fields(&company, &title, &location);

    let mut tags: Vec<String> = raw
        .tags
        .iter()
        .map(|t| normalize_text(t))
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();

    Posting {
        id: Uuid::new_v4(),
        source: normalize_text(raw.source.as_deref().unwrap_or_default()),
        source_id: raw.source_id.unwrap_or_default().trim().to_string(),
        title,
        company,
        location,
        description: raw.description.unwrap_or_default().trim().to_string(),
        url: raw.url.unwrap_or_default().trim().to_string(),
        salary_min: raw.salary_min.filter(|v| v.is_finite()),
        salary_max: raw.salary_max.filter(|v| v.is_finite()),
        date_posted: raw.date_posted.as_deref().and_then(parse_timestamp),
        date_collected: raw
            .date_collected
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(collected_at),
        tags,
        keywords: Vec::new(),
        canonical,
        score: None,
    }
}
