use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::scorer::ScoreBreakdown;

/// A posting as handed over by an external collector. Every field is optional;
/// absent values become empty strings / `None` during normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPosting {
    pub source: Option<String>,
    pub source_id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub date_posted: Option<String>,
    pub date_collected: Option<String>,
    pub tags: Vec<String>,
}

/// Lowercased, boilerplate-free forms used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFields {
    pub company: String,
    pub title: String,
    pub location: String,
    pub dedup_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub id: Uuid,
    pub source: String,
    pub source_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub date_posted: Option<DateTime<Utc>>,
    pub date_collected: DateTime<Utc>,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub canonical: CanonicalFields,
    pub score: Option<ScoreBreakdown>,
}

impl Posting {
    /// Text searched for keywords: title followed by description.
    pub fn searchable_text(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }

    pub fn dedup_key(&self) -> &str {
        &self.canonical.dedup_key
    }
}
