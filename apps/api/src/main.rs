mod config;
mod errors;
mod llm_client;
mod matching;
mod postings;
mod profile;
mod routes;
mod state;
mod tailoring;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, EngineConfig};
use crate::llm_client::build_capability;
use crate::profile::loader::load_profile;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load process configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tycho API v{}", env!("CARGO_PKG_VERSION"));

    // Engine configuration is validated before anything is scored
    let engine = EngineConfig::load(&config.engine_config_path)
        .with_context(|| format!("invalid engine config {}", config.engine_config_path.display()))?;

    // Profile: personal and skills files are required, entry files are best-effort
    let profile = load_profile(&config.profile_dir)
        .with_context(|| format!("cannot load profile from {}", config.profile_dir.display()))?;
    if !profile.issues.is_empty() {
        info!(
            "{} profile units skipped; see GET /api/v1/profile/issues",
            profile.issues.len()
        );
    }

    // Optional LLM capability (DisabledCapability when not configured)
    let capability = build_capability(&engine.llm);

    let state = AppState::new(engine, profile, capability);
    info!("Vocabulary ready: {} terms", state.vocabulary.len());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
