//! Configuration system for Nexus.
//!
//! Provides TOML-based configuration with:
//! - Config file layering (XDG user config + project-local overrides)
//! - Environment variable overrides for API keys
//! - One-shot resolution into [`Settings`] with defaults applied
//!
//! Loading never fails over a missing file; only malformed explicit input
//! is an error.

pub mod discovery;
pub mod error;
pub mod settings;
pub mod types;

pub use discovery::{
    load_config, load_config_file, load_config_with_options, user_config_dir, user_config_path,
    ConfigSource, LoadedConfig,
};
pub use error::{ConfigError, Result};
pub use settings::{
    AgentSettings, LlmSettings, SearchSettings, ServerSettings, Settings, StoreSettings,
    DEFAULT_ALLOWED_ORIGINS, DEFAULT_MODELS, GEMINI_KEY_ENV, SERPER_KEY_ENV,
};
pub use types::{
    AgentSection, LlmSection, NexusConfig, SearchSection, ServerSection, StoreSection,
};
