use std::sync::Arc;

use crate::config::EngineConfig;
use crate::llm_client::Capability;
use crate::matching::keywords::Vocabulary;
use crate::profile::loader::LoadedProfile;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything is loaded once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EngineConfig>,
    pub profile: Arc<LoadedProfile>,
    /// Built from the profile and engine config.
    pub vocabulary: Arc<Vocabulary>,
    /// Optional LLM capability. `DisabledCapability` when not configured.
    pub capability: Arc<dyn Capability>,
}

impl AppState {
    pub fn new(
        engine: EngineConfig,
        profile: LoadedProfile,
        capability: Arc<dyn Capability>,
    ) -> Self {
        let vocabulary = Vocabulary::for_profile(&profile.profile, &engine);
        Self {
            engine: Arc::new(engine),
            profile: Arc::new(profile),
            vocabulary: Arc::new(vocabulary),
            capability,
        }
    }
}
