//! Scorer: four weighted sub-scores combined into one match score.

#![allow(dead_code)]

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{LocationConfig, ScoringConfig, ScoringThresholds};
use crate::matching::keywords::{extract, term_regex, KeywordSet, Vocabulary};
use crate::postings::models::Posting;
use crate::postings::normalize::normalize_text;
use crate::profile::models::Profile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub keyword_match: f64,
    pub title_match: f64,
    pub skills_overlap: f64,
    pub location_match: f64,
    pub total: f64,
    /// Posting keywords the score was computed from.
    pub keywords: Vec<String>,
}

/// Presentation bucket for a total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestLevel {
    High,
    Medium,
    Low,
}

impl InterestLevel {
    pub fn classify(total: f64, thresholds: &ScoringThresholds) -> Self {
        if total >= thresholds.high_interest {
            InterestLevel::High
        } else if total < thresholds.low_interest {
            InterestLevel::Low
        } else {
            InterestLevel::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPosting {
    pub id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub scored: Vec<Posting>,
    pub skipped: Vec<SkippedPosting>,
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-scores
// ────────────────────────────────────────────────────────────────────────────

fn jaccard<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Lowercased words, split on anything that is not alphanumeric, '+' or '#'.
fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn keyword_match(keywords: &KeywordSet, skills: &HashSet<String>) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let hits = keywords.terms().filter(|t| skills.contains(*t)).count();
    hits as f64 / keywords.len() as f64
}

fn title_match(title: &str, profile: &Profile) -> f64 {
    let reference: HashSet<String> = profile
        .reference_titles()
        .into_iter()
        .flat_map(|t| words(t))
        .collect();
    jaccard(&words(title), &reference)
}

fn skills_overlap(keywords: &KeywordSet, skills: &HashSet<String>) -> f64 {
    let required: HashSet<String> = keywords.required_skills().into_iter().collect();
    jaccard(&required, skills)
}

/// Compiled location preferences. Build once per batch.
#[derive(Debug, Clone)]
pub struct LocationMatcher {
    abbreviations: Vec<(Regex, String)>,
    candidates: Vec<Regex>,
}

impl LocationMatcher {
    pub fn new(config: &LocationConfig) -> Self {
        let abbreviations: Vec<(Regex, String)> = config
            .abbreviations
            .iter()
            .filter_map(|(abbr, full)| term_regex(abbr).map(|re| (re, full.clone())))
            .collect();

        let mut names: Vec<String> = Vec::new();
        for preferred in &config.preferred {
            let expanded = normalize_text(&expand(&abbreviations, preferred));
            for key in [normalize_text(preferred), expanded.clone()] {
                if let Some(equivalents) = config.equivalents.get(&key) {
                    names.extend(equivalents.iter().map(|e| normalize_text(e)));
                }
            }
            names.push(expanded);
        }
        names.extend(config.remote_keywords.iter().map(|k| normalize_text(k)));
        names.sort();
        names.dedup();

        Self {
            abbreviations,
            candidates: names.iter().filter_map(|n| term_regex(n)).collect(),
        }
    }

    /// 1.0 if any preferred location, equivalent or remote keyword appears as
    /// whole words in the expanded posting location, else 0.0.
    pub fn score(&self, location: &str) -> f64 {
        if location.trim().is_empty() {
            return 0.0;
        }
        let expanded = expand(&self.abbreviations, location);
        if self.candidates.iter().any(|re| re.is_match(&expanded)) {
            1.0
        } else {
            0.0
        }
    }
}

fn expand(abbreviations: &[(Regex, String)], text: &str) -> String {
    abbreviations
        .iter()
        .fold(text.to_string(), |acc, (re, full)| {
            re.replace_all(&acc, full.as_str()).into_owned()
        })
}

pub fn location_match(location: &str, config: &LocationConfig) -> f64 {
    LocationMatcher::new(config).score(location)
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

fn score_with(
    posting: &Posting,
    keywords: &KeywordSet,
    profile: &Profile,
    config: &ScoringConfig,
    locations: &LocationMatcher,
) -> ScoreBreakdown {
    let skills: HashSet<String> = profile.skill_names().into_iter().collect();
    let w = &config.weights;

    let keyword_match = keyword_match(keywords, &skills);
    let title_match = title_match(&posting.title, profile);
    let skills_overlap = skills_overlap(keywords, &skills);
    let location_match = locations.score(&posting.location);

    let total = (w.keyword_match * keyword_match
        + w.title_match * title_match
        + w.skills_overlap * skills_overlap
        + w.location_match * location_match)
        .clamp(0.0, 1.0);

    ScoreBreakdown {
        keyword_match,
        title_match,
        skills_overlap,
        location_match,
        total,
        keywords: keywords.terms().map(str::to_string).collect(),
    }
}

/// Scores a posting against the profile with already-extracted keywords.
pub fn score(
    posting: &Posting,
    keywords: &KeywordSet,
    profile: &Profile,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    score_with(
        posting,
        keywords,
        profile,
        config,
        &LocationMatcher::new(&config.locations),
    )
}

/// Extracts keywords from the posting, then scores it.
pub fn score_posting(
    posting: &Posting,
    profile: &Profile,
    vocabulary: &Vocabulary,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let keywords = extract(&posting.searchable_text(), vocabulary);
    score(posting, &keywords, profile, config)
}

fn skip_reason(posting: &Posting) -> Option<&'static str> {
    if posting.title.trim().is_empty() {
        Some("missing title")
    } else if posting.company.trim().is_empty() {
        Some("missing company")
    } else {
        None
    }
}

/// Scores every well-formed posting in order. Postings without a title or
/// company are reported in `skipped` instead.
pub fn score_batch(
    postings: Vec<Posting>,
    profile: &Profile,
    vocabulary: &Vocabulary,
    config: &ScoringConfig,
) -> BatchOutcome {
    let locations = LocationMatcher::new(&config.locations);
    let mut outcome = BatchOutcome::default();

    for mut posting in postings {
        if let Some(reason) = skip_reason(&posting) {
            warn!("Skipping posting {}: {reason}", posting.id);
            outcome.skipped.push(SkippedPosting {
                id: posting.id,
                reason: reason.to_string(),
            });
            continue;
        }

        let keywords = extract(&posting.searchable_text(), vocabulary);
        let breakdown = score_with(&posting, &keywords, profile, config, &locations);
        debug!("Scored posting {}: total={:.3}", posting.id, breakdown.total);
        posting.keywords = breakdown.keywords.clone();
        posting.score = Some(breakdown);
        outcome.scored.push(posting);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringWeights;
    use crate::postings::models::RawPosting;
    use crate::postings::normalize::normalize;
    use crate::profile::models::Skill;

    fn profile() -> Profile {
        let mut p = Profile::default();
        p.personal.titles = vec!["Machine Learning Engineer".to_string()];
        p.skills.technical = ["Python", "PyTorch", "Docker"]
            .iter()
            .map(|n| Skill {
                name: n.to_string(),
                tags: vec![],
                priority: 1,
            })
            .collect();
        p
    }

    fn posting(title: &str, location: &str, description: &str) -> Posting {
        normalize(RawPosting {
            title: Some(title.to_string()),
            company: Some("Acme".to_string()),
            location: Some(location.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        })
    }

    fn locations(preferred: &[&str], remote: &[&str]) -> LocationConfig {
        LocationConfig {
            preferred: preferred.iter().map(|s| s.to_string()).collect(),
            remote_keywords: remote.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_total_is_weighted_sum_within_unit_range() {
        let config = ScoringConfig::default();
        let p = posting(
            "Machine Learning Engineer",
            "Madrid, Spain",
            "Python, PyTorch, Kubernetes and AWS",
        );
        let b = score_posting(&p, &profile(), &Vocabulary::builtin(), &config);

        let w = &config.weights;
        let expected = w.keyword_match * b.keyword_match
            + w.title_match * b.title_match
            + w.skills_overlap * b.skills_overlap
            + w.location_match * b.location_match;
        assert!((b.total - expected).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&b.total));
        assert_eq!(b.location_match, 1.0);
        assert_eq!(b.title_match, 1.0);
    }

    #[test]
    fn test_sub_scores() {
        let keywords = KeywordSet::from_terms(["python", "pytorch", "kubernetes", "aws"]);
        let p = posting("Data Engineer", "", "");
        let b = score(&p, &keywords, &profile(), &ScoringConfig::default());
        // 2 of 4 keywords are profile skills
        assert_eq!(b.keyword_match, 0.5);
        // {python, pytorch} / {python, pytorch, docker, kubernetes, aws}
        assert!((b.skills_overlap - 2.0 / 5.0).abs() < 1e-9);
        // {engineer} / {data, machine, learning, engineer}
        assert!((b.title_match - 0.25).abs() < 1e-9);
        assert_eq!(b.location_match, 0.0);
    }

    #[test]
    fn test_no_keywords_scores_zero_keyword_match() {
        let b = score(
            &posting("Chef", "Lisbon", ""),
            &KeywordSet::new(),
            &profile(),
            &ScoringConfig::default(),
        );
        assert_eq!(b.keyword_match, 0.0);
        assert!((0.0..=1.0).contains(&b.total));
    }

    #[test]
    fn test_total_clamped_with_full_match() {
        let config = ScoringConfig {
            weights: ScoringWeights {
                keyword_match: 0.25,
                title_match: 0.25,
                skills_overlap: 0.25,
                location_match: 0.25,
            },
            locations: locations(&["Madrid"], &[]),
            ..Default::default()
        };
        let keywords = KeywordSet::from_terms(["python", "pytorch", "docker"]);
        let p = posting("Machine Learning Engineer", "Madrid", "");
        let b = score(&p, &keywords, &profile(), &config);
        assert!((b.total - 1.0).abs() < 1e-9);
        assert!(b.total <= 1.0);
    }

    #[test]
    fn test_abbreviation_in_preferences_matches_full_name() {
        let mut config = locations(&["ES"], &[]);
        config.abbreviations.insert("ES".to_string(), "Spain".to_string());
        assert_eq!(location_match("Barcelona, Spain", &config), 1.0);
    }

    #[test]
    fn test_abbreviation_in_posting_matches_preference() {
        let mut config = locations(&["Spain"], &[]);
        config.abbreviations.insert("ES".to_string(), "Spain".to_string());
        assert_eq!(location_match("Valencia, ES", &config), 1.0);
    }

    #[test]
    fn test_spain_remote_matches_es_preference() {
        let config = LocationConfig {
            preferred: vec!["ES".to_string()],
            ..Default::default()
        };
        assert_eq!(location_match("Spain, Remote", &config), 1.0);
    }

    #[test]
    fn test_location_needs_whole_words() {
        let config = locations(&["Madrid"], &[]);
        assert_eq!(location_match("Madridejos, Toledo", &config), 0.0);
        assert_eq!(location_match("Madrid", &config), 1.0);
    }

    #[test]
    fn test_language_equivalents_match() {
        let config = LocationConfig {
            preferred: vec!["Spain".to_string()],
            remote_keywords: vec![],
            ..Default::default()
        };
        assert_eq!(location_match("Sevilla, España", &config), 1.0);
    }

    #[test]
    fn test_remote_keyword_matches_and_empty_location_does_not() {
        let config = locations(&[], &["remote"]);
        assert_eq!(location_match("Fully Remote (EU)", &config), 1.0);
        assert_eq!(location_match("", &config), 0.0);
    }

    #[test]
    fn test_batch_skips_postings_missing_title_or_company() {
        let good = posting("Backend Engineer", "Madrid", "Python and Docker");
        let mut no_company = posting("Backend Engineer", "Madrid", "Python");
        no_company.company = String::new();
        let no_title = normalize(RawPosting {
            company: Some("Acme".to_string()),
            ..Default::default()
        });

        let outcome = score_batch(
            vec![good.clone(), no_company.clone(), no_title.clone()],
            &profile(),
            &Vocabulary::builtin(),
            &ScoringConfig::default(),
        );

        assert_eq!(outcome.scored.len(), 1);
        assert_eq!(outcome.scored[0].id, good.id);
        assert!(outcome.scored[0].score.is_some());
        assert_eq!(outcome.scored[0].keywords, vec!["docker", "python"]);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].id, no_company.id);
        assert_eq!(outcome.skipped[0].reason, "missing company");
        assert_eq!(outcome.skipped[1].reason, "missing title");
    }

    #[test]
    fn test_interest_level_buckets() {
        let t = ScoringThresholds::default();
        assert_eq!(InterestLevel::classify(0.9, &t), InterestLevel::High);
        assert_eq!(InterestLevel::classify(0.75, &t), InterestLevel::High);
        assert_eq!(InterestLevel::classify(0.5, &t), InterestLevel::Medium);
        assert_eq!(InterestLevel::classify(0.1, &t), InterestLevel::Low);
    }
}
