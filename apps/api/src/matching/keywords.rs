//! Keyword Extractor: weighted terms from free-text posting content.
//!
//! The baseline is a curated vocabulary matched with word-boundary regexes.
//! An available capability may add terms and requirement classes on top.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{EngineConfig, FocusArea};
use crate::llm_client::fallback::enhanced_or;
use crate::llm_client::{complete_as, Capability};
use crate::matching::prompts::{keyword_prompt, KEYWORD_SYSTEM};
use crate::postings::normalize::normalize_text;
use crate::profile::models::Profile;

/// Occurrence counts above this are clamped.
pub const MAX_PATTERN_WEIGHT: u32 = 5;

const EXTERNAL_REQUIRED_WEIGHT: f64 = 1.0;
const EXTERNAL_NICE_TO_HAVE_WEIGHT: f64 = 0.5;
const EXTERNAL_GENERAL_WEIGHT: f64 = 0.75;

/// Built-in technology terms. Profile skills, titles and focus indicators are
/// added per profile in `Vocabulary::for_profile`.
pub const TECH_TERMS: &[&str] = &[
    // Languages
    "python", "java", "javascript", "typescript", "c++", "c#", "go", "rust", "ruby", "php",
    "swift", "kotlin", "scala", "r", "matlab",
    // ML / AI
    "pytorch", "tensorflow", "keras", "scikit-learn", "sklearn", "pandas", "numpy", "scipy",
    "matplotlib", "langchain", "llm", "rag", "gpt", "bert", "transformer",
    // Cloud / infra
    "docker", "kubernetes", "aws", "azure", "gcp", "cloud",
    // Data stores
    "sql", "postgresql", "mysql", "mongodb", "redis", "elasticsearch",
    // Web
    "react", "vue", "angular", "node", "fastapi", "flask", "django",
    // Practices
    "git", "ci/cd", "linux", "agile", "scrum",
    // Domains
    "machine learning", "deep learning", "computer vision", "nlp",
    "natural language processing", "reinforcement learning", "data science",
    "data engineering", "mlops", "onnx", "cuda", "tensorrt",
    // APIs
    "api", "rest", "graphql", "microservices",
];

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Pattern,
    External,
}

/// Ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    General,
    NiceToHave,
    Required,
}

impl Requirement {
    fn external_weight(self) -> f64 {
        match self {
            Requirement::Required => EXTERNAL_REQUIRED_WEIGHT,
            Requirement::NiceToHave => EXTERNAL_NICE_TO_HAVE_WEIGHT,
            Requirement::General => EXTERNAL_GENERAL_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub provenance: Provenance,
    pub weight: f64,
    pub requirement: Requirement,
}

/// Normalized term → keyword, iterated in term order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet {
    keywords: BTreeMap<String, Keyword>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set of pattern keywords with weight 1 from bare terms.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for term in terms {
            set.insert_pattern(term.as_ref(), 1);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.keywords.contains_key(&normalize_text(term))
    }

    pub fn get(&self, term: &str) -> Option<&Keyword> {
        self.keywords.get(&normalize_text(term))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }

    pub fn insert_pattern(&mut self, term: &str, count: u32) {
        let term = normalize_text(term);
        if term.is_empty() || count == 0 {
            return;
        }
        let weight = f64::from(count.min(MAX_PATTERN_WEIGHT));
        self.keywords.insert(
            term.clone(),
            Keyword {
                term,
                provenance: Provenance::Pattern,
                weight,
                requirement: Requirement::General,
            },
        );
    }

    /// Adds an externally supplied term, or upgrades an existing one to the
    /// stronger requirement class.
    pub fn merge_external(&mut self, term: &str, requirement: Requirement) {
        let term = normalize_text(term);
        if term.is_empty() {
            return;
        }
        let weight = requirement.external_weight();
        self.keywords
            .entry(term.clone())
            .and_modify(|existing| {
                existing.requirement = existing.requirement.max(requirement);
                existing.weight = existing.weight.max(weight);
            })
            .or_insert(Keyword {
                term,
                provenance: Provenance::External,
                weight,
                requirement,
            });
    }

    /// Externally-required terms when there are any, otherwise every term.
    pub fn required_skills(&self) -> Vec<String> {
        let required: Vec<String> = self
            .keywords
            .values()
            .filter(|k| k.requirement == Requirement::Required)
            .map(|k| k.term.clone())
            .collect();
        if required.is_empty() {
            self.keywords.keys().cloned().collect()
        } else {
            required
        }
    }
}

/// Structured capability output for keyword extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalKeywords {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub nice_to_have_skills: Vec<String>,
    #[serde(default)]
    pub focus_area: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Vocabulary
// ────────────────────────────────────────────────────────────────────────────

/// Curated terms, each compiled once into a case-insensitive matcher.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    patterns: Vec<(String, Regex)>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive matcher for a term. Words may be separated by any
/// whitespace; `\b` is only added on sides that are word characters, so
/// "c++" and "ci/cd" still match.
pub fn term_regex(term: &str) -> Option<Regex> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    let body = term
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let lead = if term.starts_with(is_word_char) { r"\b" } else { "" };
    let tail = if term.ends_with(is_word_char) { r"\b" } else { "" };
    match Regex::new(&format!("(?i){lead}{body}{tail}")) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Skipping vocabulary term '{term}': {e}");
            None
        }
    }
}

impl Vocabulary {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = terms
            .into_iter()
            .map(|t| normalize_text(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        let patterns = unique
            .into_iter()
            .filter_map(|term| term_regex(&term).map(|re| (term, re)))
            .collect();
        Self { patterns }
    }

    pub fn builtin() -> Self {
        Self::new(TECH_TERMS)
    }

    /// Built-in terms plus profile skills and titles, focus indicators and
    /// configured extra terms.
    pub fn for_profile(profile: &Profile, config: &EngineConfig) -> Self {
        let mut terms: Vec<String> = TECH_TERMS.iter().map(|t| t.to_string()).collect();
        terms.extend(profile.skill_names());
        terms.extend(profile.reference_titles().into_iter().map(str::to_string));
        terms.extend(
            config
                .focus_areas
                .iter()
                .flat_map(|a| a.indicators.iter().cloned()),
        );
        terms.extend(config.vocabulary.extra_terms.iter().cloned());
        let vocabulary = Self::new(terms);
        debug!("Vocabulary built with {} terms", vocabulary.len());
        vocabulary
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Baseline extraction: one pattern keyword per matched vocabulary term.
pub fn extract(text: &str, vocabulary: &Vocabulary) -> KeywordSet {
    let mut set = KeywordSet::new();
    for (term, re) in &vocabulary.patterns {
        let count = re.find_iter(text).count();
        if count > 0 {
            set.insert_pattern(term, u32::try_from(count).unwrap_or(u32::MAX));
        }
    }
    set
}

/// Folds capability output into a baseline set.
pub fn merge_external(set: &mut KeywordSet, external: &ExternalKeywords) {
    for term in &external.keywords {
        set.merge_external(term, Requirement::General);
    }
    for term in &external.nice_to_have_skills {
        set.merge_external(term, Requirement::NiceToHave);
    }
    for term in &external.required_skills {
        set.merge_external(term, Requirement::Required);
    }
}

/// Enhanced extraction output. `focus_hint` is the capability's unchecked
/// focus answer; `focus::classify_with_fallback` decides whether to accept it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnhancedKeywords {
    pub keywords: KeywordSet,
    pub focus_hint: Option<String>,
}

/// Baseline extraction enriched by the capability when it answers in time.
pub async fn extract_enhanced(
    text: &str,
    vocabulary: &Vocabulary,
    focus_areas: &[FocusArea],
    capability: &dyn Capability,
    timeout: Duration,
) -> EnhancedKeywords {
    let mut keywords = extract(text, vocabulary);
    let names: Vec<&str> = focus_areas.iter().map(|a| a.name.as_str()).collect();
    let prompt = keyword_prompt(text, &names);

    let external = enhanced_or(capability, timeout, "keyword extraction", || {
        complete_as::<ExternalKeywords>(capability, &prompt, KEYWORD_SYSTEM)
    })
    .await;

    let focus_hint = match external {
        Some(external) => {
            merge_external(&mut keywords, &external);
            external.focus_area.filter(|f| !f.trim().is_empty())
        }
        None => None,
    };
    EnhancedKeywords {
        keywords,
        focus_hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_focus_areas;
    use crate::llm_client::testing::ScriptedCapability;
    use crate::llm_client::DisabledCapability;

    fn terms(set: &KeywordSet) -> Vec<&str> {
        set.terms().collect()
    }

    #[test]
    fn test_go_does_not_match_inside_good() {
        let set = extract("A good team with good vibes", &Vocabulary::builtin());
        assert!(!set.contains("go"));
    }

    #[test]
    fn test_symbol_terms_match() {
        let set = extract(
            "Experience with C++, C# and CI/CD pipelines",
            &Vocabulary::builtin(),
        );
        assert!(set.contains("c++"));
        assert!(set.contains("c#"));
        assert!(set.contains("ci/cd"));
    }

    #[test]
    fn test_multi_word_terms_match_across_whitespace() {
        let set = extract("Strong Machine\n   Learning background", &Vocabulary::builtin());
        assert!(set.contains("machine learning"));
    }

    #[test]
    fn test_weight_is_capped_occurrence_count() {
        let text = "python ".repeat(9) + "docker docker";
        let set = extract(&text, &Vocabulary::builtin());
        assert_eq!(set.get("python").unwrap().weight, f64::from(MAX_PATTERN_WEIGHT));
        assert_eq!(set.get("docker").unwrap().weight, 2.0);
        assert_eq!(set.get("docker").unwrap().provenance, Provenance::Pattern);
    }

    #[test]
    fn test_terms_are_deterministically_ordered() {
        let set = extract("rust, docker, aws", &Vocabulary::builtin());
        assert_eq!(terms(&set), vec!["aws", "docker", "rust"]);
    }

    #[test]
    fn test_vocabulary_includes_profile_and_config_terms() {
        let mut profile = Profile::default();
        profile.skills.technical.push(crate::profile::models::Skill {
            name: "Polars".to_string(),
            tags: vec![],
            priority: 1,
        });
        let mut config = EngineConfig::default();
        config.vocabulary.extra_terms.push("Bevy".to_string());

        let vocab = Vocabulary::for_profile(&profile, &config);
        let set = extract("We use polars and bevy for analytics", &vocab);
        assert!(set.contains("polars"));
        assert!(set.contains("bevy"));
        assert!(set.contains("analytics"));
    }

    #[test]
    fn test_required_skills_falls_back_to_all_terms() {
        let set = KeywordSet::from_terms(["rust", "docker"]);
        assert_eq!(set.required_skills(), vec!["docker", "rust"]);
    }

    #[test]
    fn test_merge_external_upgrades_requirement() {
        let mut set = KeywordSet::from_terms(["python"]);
        let external = ExternalKeywords {
            keywords: vec!["Airflow".to_string()],
            required_skills: vec!["Python".to_string()],
            nice_to_have_skills: vec!["kubernetes".to_string()],
            focus_area: None,
        };
        merge_external(&mut set, &external);

        let python = set.get("python").unwrap();
        assert_eq!(python.requirement, Requirement::Required);
        assert_eq!(python.provenance, Provenance::Pattern);
        assert_eq!(set.get("airflow").unwrap().weight, 0.75);
        assert_eq!(set.get("kubernetes").unwrap().weight, 0.5);
        assert_eq!(set.get("kubernetes").unwrap().provenance, Provenance::External);
        assert_eq!(set.required_skills(), vec!["python"]);
    }

    #[tokio::test]
    async fn test_extract_enhanced_merges_capability_output() {
        let cap = ScriptedCapability::replying(
            r#"{"keywords": ["airflow"], "required_skills": ["python"], "nice_to_have_skills": []}"#,
        );
        let out = extract_enhanced(
            "Python developer",
            &Vocabulary::builtin(),
            &default_focus_areas(),
            &cap,
            Duration::from_secs(1),
        )
        .await;
        assert!(out.keywords.contains("airflow"));
        assert_eq!(out.keywords.required_skills(), vec!["python"]);
        assert_eq!(out.focus_hint, None);
    }

    #[tokio::test]
    async fn test_extract_enhanced_returns_focus_hint() {
        let cap = ScriptedCapability::replying(
            r#"{"keywords": ["pytorch"], "required_skills": [], "focus_area": "ml_focus"}"#,
        );
        let out = extract_enhanced(
            "Research engineer",
            &Vocabulary::builtin(),
            &default_focus_areas(),
            &cap,
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(out.focus_hint.as_deref(), Some("ml_focus"));
        assert_eq!(cap.calls(), 1);
    }

    #[tokio::test]
    async fn test_extract_enhanced_falls_back_to_baseline() {
        let text = "Rust and Docker";
        let vocab = Vocabulary::builtin();
        let baseline = extract(text, &vocab);

        let areas = default_focus_areas();
        let broken = ScriptedCapability::replying("not json at all");
        let disabled = DisabledCapability;
        let timeout = Duration::from_secs(1);
        let expected = EnhancedKeywords {
            keywords: baseline,
            focus_hint: None,
        };
        assert_eq!(
            extract_enhanced(text, &vocab, &areas, &broken, timeout).await,
            expected
        );
        assert_eq!(
            extract_enhanced(text, &vocab, &areas, &disabled, timeout).await,
            expected
        );
    }
}
