//! Error types for agent operations.

use thiserror::Error;

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model backend error.
    #[error("Model error: {0}")]
    Llm(#[from] nexus_llm::LlmError),

    /// Entity store error.
    #[error("Store error: {0}")]
    Store(#[from] nexus_store::StoreError),

    /// Tool execution failed.
    #[error("Tool error: {0}")]
    Tool(String),

    /// The model requested a tool that is not registered.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Create a tool error.
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
