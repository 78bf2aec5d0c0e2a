use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Tolerance applied when checking that the scoring weights sum to 1.0.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Process-level configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub engine_config_path: PathBuf,
    pub profile_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            engine_config_path: std::env::var("TYCHO_CONFIG")
                .unwrap_or_else(|_| "config.yaml".to_string())
                .into(),
            profile_dir: std::env::var("PROFILE_DIR")
                .unwrap_or_else(|_| "profile".to_string())
                .into(),
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Scoring weights must sum to 1.0, got {sum:.6}")]
    WeightsSum { sum: f64 },

    #[error("Scoring weight '{name}' must be within [0, 1], got {value}")]
    WeightOutOfRange { name: &'static str, value: f64 },

    #[error("Interest thresholds must satisfy 0 <= low <= high <= 1 (low={low}, high={high})")]
    Thresholds { low: f64, high: f64 },

    #[error("Unknown focus area '{0}' referenced in config")]
    UnknownFocusArea(String),

    #[error("Focus area '{0}' is defined more than once")]
    DuplicateFocusArea(String),

    #[error("tailoring.max_bullets_per_entry must be at least 1")]
    ZeroBulletLimit,
}

// ────────────────────────────────────────────────────────────────────────────
// Engine configuration (config.yaml)
// ────────────────────────────────────────────────────────────────────────────

/// Weights for the four sub-scores. Must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub keyword_match: f64,
    pub title_match: f64,
    pub skills_overlap: f64,
    pub location_match: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword_match: 0.35,
            title_match: 0.25,
            skills_overlap: 0.25,
            location_match: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.keyword_match + self.title_match + self.skills_overlap + self.location_match
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("keyword_match", self.keyword_match),
            ("title_match", self.title_match),
            ("skills_overlap", self.skills_overlap),
            ("location_match", self.location_match),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightsSum { sum });
        }
        Ok(())
    }
}

/// Display thresholds. Consumed by presentation only, never by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringThresholds {
    pub high_interest: f64,
    pub low_interest: f64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            high_interest: 0.75,
            low_interest: 0.30,
        }
    }
}

/// Location preferences used by the binary location sub-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub preferred: Vec<String>,
    pub remote_keywords: Vec<String>,
    /// Abbreviation → expansion, e.g. "ES" → "Spain". Matched on whole words.
    pub abbreviations: BTreeMap<String, String>,
    /// Location → equivalents in other languages, e.g. "spain" → ["españa"].
    pub equivalents: BTreeMap<String, Vec<String>>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            preferred: ["Madrid", "London", "Edinburgh", "Spain", "UK"]
                .map(String::from)
                .to_vec(),
            remote_keywords: ["remote", "remoto", "teletrabajo"]
                .map(String::from)
                .to_vec(),
            abbreviations: BTreeMap::from([
                ("ES".to_string(), "Spain".to_string()),
                ("UK".to_string(), "United Kingdom".to_string()),
            ]),
            equivalents: BTreeMap::from([
                ("spain".to_string(), vec!["españa".to_string()]),
                ("london".to_string(), vec!["londres".to_string()]),
                ("edinburgh".to_string(), vec!["edimburgo".to_string()]),
                ("united kingdom".to_string(), vec!["reino unido".to_string()]),
            ]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub thresholds: ScoringThresholds,
    pub locations: LocationConfig,
}

/// A named focus area and the keywords that indicate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusArea {
    pub name: String,
    pub indicators: Vec<String>,
}

impl FocusArea {
    fn new(name: &str, indicators: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            indicators: indicators.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub fn default_focus_areas() -> Vec<FocusArea> {
    vec![
        FocusArea::new(
            "ml_focus",
            &[
                "pytorch",
                "tensorflow",
                "machine learning",
                "deep learning",
                "computer vision",
                "nlp",
                "onnx",
                "cuda",
                "ml",
            ],
        ),
        FocusArea::new(
            "backend_focus",
            &[
                "backend",
                "api",
                "fastapi",
                "django",
                "flask",
                "microservices",
                "docker",
                "kubernetes",
            ],
        ),
        FocusArea::new(
            "data_focus",
            &[
                "data science",
                "data engineering",
                "analytics",
                "pandas",
                "statistics",
                "data",
            ],
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailoringConfig {
    pub max_bullets_per_entry: usize,
    pub max_skills: usize,
    pub language: String,
    /// Pins every tailoring run to this focus area instead of classifying.
    pub forced_focus: Option<String>,
}

impl Default for TailoringConfig {
    fn default() -> Self {
        Self {
            max_bullets_per_entry: 4,
            max_skills: 15,
            language: "en".to_string(),
            forced_focus: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    pub extra_terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "anthropic" | "openai" | "ollama"
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub enabled: bool,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            temperature: 0.3,
            enabled: true,
            base_url: None,
            timeout_secs: 20,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Everything the engine needs, passed explicitly into scoring and tailoring calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub focus_areas: Vec<FocusArea>,
    pub tailoring: TailoringConfig,
    pub vocabulary: VocabularyConfig,
    pub llm: LlmConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            focus_areas: default_focus_areas(),
            tailoring: TailoringConfig::default(),
            vocabulary: VocabularyConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads and validates the engine config. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No engine config at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        info!("Engine config loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = if raw.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.weights.validate()?;

        let t = &self.scoring.thresholds;
        if !(0.0..=1.0).contains(&t.low_interest)
            || !(0.0..=1.0).contains(&t.high_interest)
            || t.low_interest > t.high_interest
        {
            return Err(ConfigError::Thresholds {
                low: t.low_interest,
                high: t.high_interest,
            });
        }

        let mut seen = HashSet::new();
        for area in &self.focus_areas {
            if !seen.insert(area.name.as_str()) {
                return Err(ConfigError::DuplicateFocusArea(area.name.clone()));
            }
        }

        if let Some(forced) = &self.tailoring.forced_focus {
            if !seen.contains(forced.as_str()) {
                return Err(ConfigError::UnknownFocusArea(forced.clone()));
            }
        }

        if self.tailoring.max_bullets_per_entry == 0 {
            return Err(ConfigError::ZeroBulletLimit);
        }

        Ok(())
    }

    pub fn focus_area_names(&self) -> impl Iterator<Item = &str> {
        self.focus_areas.iter().map(|a| a.name.as_str())
    }
}
