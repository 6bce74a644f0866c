//! CLI command handlers.

pub mod ask;
pub mod bootstrap;
pub mod seed;
pub mod serve;
pub mod status;

use std::path::PathBuf;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Explicit config file path, skipping discovery.
    pub config: Option<PathBuf>,
}
