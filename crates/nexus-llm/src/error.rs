//! Error types for model provider operations.

use thiserror::Error;

/// Result type alias for model provider operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when calling a model provider.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider reported quota or rate exhaustion for one model.
    ///
    /// Recoverable: the fallback executor advances to the next model in
    /// its chain.
    #[error("Model quota exhausted: {0}")]
    QuotaExhausted(String),

    /// The request deadline elapsed before the provider answered.
    ///
    /// Recoverable: one slow model does not rule out the next one.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Every model in the fallback chain failed recoverably.
    #[error("All models exhausted after {} attempts: {}", tried.len(), tried.join(", "))]
    AllModelsExhausted {
        /// Models attempted, in chain order.
        tried: Vec<String>,
    },

    /// Authentication or authorization failure.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Provider-reported error that is not quota related.
    #[error("API error: {0}")]
    Api(String),

    /// Network or transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Whether this error should advance the fallback chain.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::QuotaExhausted(_) | LlmError::Timeout(_))
    }

    /// Whether this error is specifically quota exhaustion.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, LlmError::QuotaExhausted(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else if err.is_connect() {
            LlmError::Network(format!("Connection failed: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
