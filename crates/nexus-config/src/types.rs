//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [llm]       # model provider
//! [search]    # web search provider
//! [store]     # entity database
//! [server]    # HTTP server
//! [agent]     # conversation loop
//! ```

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// Maps to the full TOML config file. All sections and fields are optional
/// so partial configs (e.g. project-local overrides) can be loaded and
/// merged; [`crate::Settings`] supplies the defaults afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    /// Model provider configuration.
    pub llm: Option<LlmSection>,

    /// Web search provider configuration.
    pub search: Option<SearchSection>,

    /// Entity store configuration.
    pub store: Option<StoreSection>,

    /// HTTP server configuration.
    pub server: Option<ServerSection>,

    /// Conversation loop configuration.
    pub agent: Option<AgentSection>,
}

impl NexusConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    /// Sections replace wholesale.
    pub fn merge(&mut self, other: NexusConfig) {
        if other.llm.is_some() {
            self.llm = other.llm;
        }

        if other.search.is_some() {
            self.search = other.search;
        }

        if other.store.is_some() {
            self.store = other.store;
        }

        if other.server.is_some() {
            self.server = other.server;
        }

        if other.agent.is_some() {
            self.agent = other.agent;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// The `[llm]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// API key. Prefer the `GEMINI_API_KEY` environment variable.
    pub api_key: Option<String>,

    /// Ordered fallback chain of model identifiers.
    pub models: Option<Vec<String>>,

    /// Custom API base URL.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// The `[search]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// API key. Prefer the `SERPER_API_KEY` environment variable.
    pub api_key: Option<String>,

    /// Maximum number of web results per search.
    pub max_results: Option<usize>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// The `[store]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Path to the SQLite database file.
    pub path: Option<String>,
}

/// The `[server]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address.
    pub bind: Option<String>,

    /// Listen port.
    pub port: Option<u16>,

    /// Origins allowed by CORS.
    pub allowed_origins: Option<Vec<String>>,
}

/// The `[agent]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// Upper bound on tool rounds per query.
    pub max_tool_rounds: Option<u32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
