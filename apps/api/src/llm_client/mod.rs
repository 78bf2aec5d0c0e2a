/// LLM capability: the single optional boundary for language-model calls.
///
/// ARCHITECTURAL RULE: the engine never requires a provider. Every call site
/// goes through `fallback::enhanced_or`, which turns unavailability, errors and
/// timeouts into `None` so the deterministic baseline is used instead.
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::LlmConfig;

pub mod anthropic;
pub mod fallback;
pub mod ollama;
pub mod openai;
pub mod prompts;

#[cfg(test)]
pub mod testing;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Plain and structured completion, plus an availability check.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether calls can be attempted at all (enabled + credentials present).
    fn available(&self) -> bool;

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;

    /// Calls `complete` and parses the text as JSON. The prompt must ask for JSON.
    async fn complete_structured(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<serde_json::Value, LlmError> {
        let text = self.complete(prompt, system).await?;
        serde_json::from_str(strip_json_fences(&text)).map_err(LlmError::Parse)
    }
}

pub type DynCapability = Arc<dyn Capability>;

/// Structured completion deserialized straight into `T`.
pub async fn complete_as<T: DeserializeOwned>(
    capability: &dyn Capability,
    prompt: &str,
    system: &str,
) -> Result<T, LlmError> {
    let value = capability.complete_structured(prompt, system).await?;
    serde_json::from_value(value).map_err(LlmError::Parse)
}

/// Always unavailable. Used when the capability is disabled or misconfigured.
pub struct DisabledCapability;

#[async_trait]
impl Capability for DisabledCapability {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn available(&self) -> bool {
        false
    }

    async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
        Err(LlmError::EmptyContent)
    }
}

/// Builds the provider adapter named in config. Anything unusable degrades to
/// `DisabledCapability` rather than failing startup.
pub fn build_capability(config: &LlmConfig) -> DynCapability {
    if !config.enabled {
        info!("LLM capability disabled by config");
        return Arc::new(DisabledCapability);
    }

    let built: Result<DynCapability, LlmError> = match config.provider.as_str() {
        "anthropic" => match env_key("ANTHROPIC_API_KEY") {
            Some(key) => AnthropicProvider::new(key, config).map(|p| Arc::new(p) as DynCapability),
            None => {
                info!("ANTHROPIC_API_KEY not set; LLM capability unavailable");
                return Arc::new(DisabledCapability);
            }
        },
        "openai" => match env_key("OPENAI_API_KEY") {
            Some(key) => OpenAiProvider::new(key, config).map(|p| Arc::new(p) as DynCapability),
            None => {
                info!("OPENAI_API_KEY not set; LLM capability unavailable");
                return Arc::new(DisabledCapability);
            }
        },
        "ollama" => OllamaProvider::new(config).map(|p| Arc::new(p) as DynCapability),
        other => {
            warn!("Unknown LLM provider '{other}'; LLM capability unavailable");
            return Arc::new(DisabledCapability);
        }
    };

    match built {
        Ok(capability) => {
            info!(
                "LLM capability initialized (provider: {}, model: {})",
                capability.name(),
                config.model
            );
            capability
        }
        Err(e) => {
            warn!("Failed to initialize LLM provider: {e}");
            Arc::new(DisabledCapability)
        }
    }
}

fn env_key(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCapability;
    use serde::Deserialize;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_disabled_config_builds_disabled_capability() {
        let config = LlmConfig {
            enabled: false,
            ..Default::default()
        };
        let capability = build_capability(&config);
        assert!(!capability.available());
        assert_eq!(capability.name(), "disabled");
    }

    #[test]
    fn test_unknown_provider_builds_disabled_capability() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(!build_capability(&config).available());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            model: "llama3".to_string(),
            ..Default::default()
        };
        let capability = build_capability(&config);
        assert_eq!(capability.name(), "ollama");
        assert!(capability.available());
    }

    #[tokio::test]
    async fn test_complete_as_parses_fenced_json() {
        #[derive(Deserialize)]
        struct Reply {
            focus_area: Option<String>,
        }
        let capability = ScriptedCapability::replying("```json\n{\"focus_area\": \"ml_focus\"}\n```");
        let reply: Reply = complete_as(&capability, "prompt", "system").await.unwrap();
        assert_eq!(reply.focus_area.as_deref(), Some("ml_focus"));
    }

    #[tokio::test]
    async fn test_complete_structured_rejects_prose() {
        let capability = ScriptedCapability::replying("Sure! Here is the answer.");
        assert!(matches!(
            capability.complete_structured("p", "s").await,
            Err(LlmError::Parse(_))
        ));
    }
}
