//! Resolved runtime settings.
//!
//! [`Settings::resolve`] turns a merged [`NexusConfig`] plus environment
//! variables into concrete values, applying defaults for everything left
//! unset. Resolution happens once at startup; the rest of the system only
//! sees `Settings`.

use std::path::PathBuf;
use std::time::Duration;

use crate::NexusConfig;

/// Environment variable carrying the model provider API key.
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable carrying the web search API key.
pub const SERPER_KEY_ENV: &str = "SERPER_API_KEY";

/// Default model fallback chain, strongest first.
pub const DEFAULT_MODELS: [&str; 3] = [
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
];

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_RESULTS: usize = 5;
const DEFAULT_STORE_PATH: &str = "nexus.db";
const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_TOOL_ROUNDS: u32 = 6;

/// Default CORS origins: the local dev frontends.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] =
    ["http://localhost:5173", "http://localhost:5174"];

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Model provider settings.
    pub llm: LlmSettings,
    /// Web search settings.
    pub search: SearchSettings,
    /// Entity store settings.
    pub store: StoreSettings,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Conversation loop settings.
    pub agent: AgentSettings,
}

/// Resolved model provider settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// API key, if configured anywhere.
    pub api_key: Option<String>,
    /// Ordered fallback chain, never empty.
    pub models: Vec<String>,
    /// Custom base URL; `None` keeps the provider default.
    pub base_url: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
}

/// Resolved web search settings.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// API key, if configured anywhere.
    pub api_key: Option<String>,
    /// Maximum results per search.
    pub max_results: usize,
    /// Request timeout.
    pub timeout: Duration,
}

/// Resolved entity store settings.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// SQLite database path.
    pub path: PathBuf,
}

/// Resolved HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Bind address.
    pub bind: String,
    /// Listen port.
    pub port: u16,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl ServerSettings {
    /// `bind:port` as a socket address string.
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Resolved conversation loop settings.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Upper bound on tool rounds per query.
    pub max_tool_rounds: u32,
}

impl Settings {
    /// Resolve settings from config and the process environment.
    pub fn resolve(config: &NexusConfig) -> Self {
        Self::resolve_with_env(
            config,
            read_key_env(GEMINI_KEY_ENV),
            read_key_env(SERPER_KEY_ENV),
        )
    }

    /// Resolve settings with explicit environment values. Environment keys
    /// take priority over config file keys.
    pub fn resolve_with_env(
        config: &NexusConfig,
        gemini_key: Option<String>,
        serper_key: Option<String>,
    ) -> Self {
        let llm = config.llm.clone().unwrap_or_default();
        let search = config.search.clone().unwrap_or_default();
        let store = config.store.clone().unwrap_or_default();
        let server = config.server.clone().unwrap_or_default();
        let agent = config.agent.clone().unwrap_or_default();

        let models = match llm.models {
            Some(models) if !models.is_empty() => models,
            _ => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        Self {
            llm: LlmSettings {
                api_key: gemini_key.or(llm.api_key),
                models,
                base_url: llm.base_url,
                timeout: Duration::from_secs(
                    llm.timeout_secs.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
                ),
            },
            search: SearchSettings {
                api_key: serper_key.or(search.api_key),
                max_results: search.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
                timeout: Duration::from_secs(
                    search.timeout_secs.unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
                ),
            },
            store: StoreSettings {
                path: PathBuf::from(store.path.unwrap_or_else(|| DEFAULT_STORE_PATH.to_string())),
            },
            server: ServerSettings {
                bind: server.bind.unwrap_or_else(|| DEFAULT_BIND.to_string()),
                port: server.port.unwrap_or(DEFAULT_PORT),
                allowed_origins: server.allowed_origins.unwrap_or_else(|| {
                    DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()
                }),
            },
            agent: AgentSettings {
                max_tool_rounds: agent.max_tool_rounds.unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
            },
        }
    }
}

/// Read an API key env var, treating empty values as unset.
fn read_key_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
