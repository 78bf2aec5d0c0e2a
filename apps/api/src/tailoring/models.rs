use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TailoringConfig;
use crate::profile::models::{EntryKind, PersonalInfo, SpokenLanguage, DEFAULT_LANGUAGE};
use crate::profile::validation::ValidationIssue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailorOptions {
    pub max_bullets_per_entry: usize,
    pub language: String,
    pub max_skills: usize,
}

impl Default for TailorOptions {
    fn default() -> Self {
        Self {
            max_bullets_per_entry: 4,
            language: DEFAULT_LANGUAGE.to_string(),
            max_skills: 15,
        }
    }
}

impl From<&TailoringConfig> for TailorOptions {
    fn from(config: &TailoringConfig) -> Self {
        Self {
            max_bullets_per_entry: config.max_bullets_per_entry,
            language: config.language.clone(),
            max_skills: config.max_skills,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredBullet {
    pub id: String,
    pub text: String,
    /// Bullet tags shared with the posting keywords.
    pub relevance: usize,
    /// Focus area whose variation supplied `text`, if any.
    pub variation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredEntry {
    pub id: String,
    pub kind: EntryKind,
    pub title: String,
    pub organization: String,
    pub dates: String,
    pub location: String,
    pub note: Option<String>,
    pub gpa: Option<String>,
    pub skills: Vec<String>,
    pub bullets: Vec<TailoredBullet>,
}

/// Read-only, per-posting selection of profile content handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredView {
    pub posting_id: Uuid,
    pub focus: Option<String>,
    pub summary: String,
    pub skills: Vec<String>,
    pub languages: Vec<SpokenLanguage>,
    pub personal: PersonalInfo,
    pub entries: Vec<TailoredEntry>,
    pub issues: Vec<ValidationIssue>,
}
