//! Shared wiring for commands that need settings or a full agent.

use std::sync::Arc;

use anyhow::Result;

use nexus_agent::{Agent, SerperConfig};
use nexus_config::{ConfigSource, LoadedConfig, Settings};
use nexus_llm::{FallbackPolicy, GeminiBackend, GeminiConfig};
use nexus_store::EntityStore;

use super::Context;

/// Load configuration, print warnings, and resolve runtime settings.
pub fn load_settings(ctx: &Context) -> Result<Settings> {
    let loaded = if let Some(ref config_path) = ctx.config {
        // Explicit config file
        let config = nexus_config::load_config_file(config_path)?;
        LoadedConfig {
            config,
            sources: vec![ConfigSource {
                path: config_path.clone(),
                loaded: true,
            }],
            warnings: Vec::new(),
        }
    } else {
        nexus_config::load_config(None)?
    };

    // Print warnings (plaintext keys, unreadable layers)
    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    Ok(Settings::resolve(&loaded.config))
}

/// Build the agent from resolved settings.
pub fn build_agent(settings: &Settings, verbose: bool) -> Result<Agent> {
    // ── Model backend ───────────────────────────────────────────────────

    let mut gemini = GeminiConfig::default().with_timeout(settings.llm.timeout);
    gemini.api_key = settings.llm.api_key.clone();
    if let Some(ref base_url) = settings.llm.base_url {
        gemini = gemini.with_base_url(base_url);
    }
    let backend = Arc::new(GeminiBackend::new(gemini)?);

    let policy = FallbackPolicy::new(settings.llm.models.clone())?;

    if verbose {
        println!("Models: {}", settings.llm.models.join(", "));
    }

    // ── Entity store ────────────────────────────────────────────────────

    let store = Arc::new(EntityStore::open(&settings.store.path)?);
    store.seed()?;

    if verbose {
        println!(
            "Entity store: {} ({} records)",
            settings.store.path.display(),
            store.count()?
        );
    }

    // ── Web search ──────────────────────────────────────────────────────

    let mut serper = SerperConfig::default()
        .with_max_results(settings.search.max_results)
        .with_timeout(settings.search.timeout);
    serper.api_key = settings.search.api_key.clone();

    let agent = Agent::builder()
        .with_backend(backend)
        .with_policy(policy)
        .with_store(store)
        .with_serper_config(serper)
        .with_max_tool_rounds(settings.agent.max_tool_rounds)
        .build()?;

    Ok(agent)
}
