//! Application state shared across handlers.

use std::sync::Arc;

use nexus_agent::Agent;
use nexus_store::EntityStore;

use crate::config::ServerConfig;

/// Which provider credentials were present at startup. Reported by the
/// status endpoint so a frontend can explain degraded behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyFlags {
    /// A model provider API key was configured.
    pub gemini: bool,
    /// A web search API key was configured.
    pub serper: bool,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The agent instance.
    pub agent: Arc<Agent>,

    /// The entity store, shared with the agent.
    pub store: Arc<EntityStore>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Provider credential flags.
    pub keys: KeyFlags,
}

impl AppState {
    /// Create a new application state around an agent.
    pub fn new(agent: Agent, config: ServerConfig) -> Self {
        let store = agent.store().clone();
        Self {
            agent: Arc::new(agent),
            store,
            config: Arc::new(config),
            keys: KeyFlags::default(),
        }
    }

    /// Record which provider credentials are configured.
    pub fn with_key_flags(mut self, keys: KeyFlags) -> Self {
        self.keys = keys;
        self
    }
}
