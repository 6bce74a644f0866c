//! Ordered model fallback.
//!
//! The executor walks an ordered chain of model identifiers for every call:
//! quota exhaustion or a timeout on one model advances to the next, any
//! other failure aborts, and an empty remainder fails with
//! [`LlmError::AllModelsExhausted`]. Every model call in the system goes
//! through this seam; nothing calls a backend directly.

use std::sync::Arc;

use crate::backend::SharedBackend;
use crate::error::{LlmError, Result};
use crate::session::ChatSession;
use crate::types::{ModelRequest, ModelResponse, ToolDefinition};

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered, immutable chain of model identifiers.
///
/// Built once from configuration before any traffic is served.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    models: Vec<String>,
}

impl FallbackPolicy {
    /// Create a policy from an ordered model list.
    pub fn new(models: Vec<String>) -> Result<Self> {
        if models.is_empty() {
            return Err(LlmError::Config(
                "Fallback chain must contain at least one model".to_string(),
            ));
        }
        Ok(Self { models })
    }

    /// The models in chain order.
    pub fn models(&self) -> &[String] {
        &self.models
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Executor
// ─────────────────────────────────────────────────────────────────────────────

/// Runs generation calls across the policy's chain.
#[derive(Clone)]
pub struct FallbackExecutor {
    backend: SharedBackend,
    policy: Arc<FallbackPolicy>,
}

impl FallbackExecutor {
    /// Create an executor over the given backend and policy.
    pub fn new(backend: SharedBackend, policy: FallbackPolicy) -> Self {
        Self {
            backend,
            policy: Arc::new(policy),
        }
    }

    /// The policy this executor walks.
    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    /// Run one generation call, advancing the chain on quota exhaustion
    /// or a timeout.
    pub async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let mut tried = Vec::new();

        for model in self.policy.models() {
            match self.backend.generate(model, request).await {
                Ok(response) => {
                    if !tried.is_empty() {
                        tracing::info!(
                            model = %model,
                            exhausted = tried.len(),
                            "Model succeeded after fallback"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        model = %model,
                        error = %e,
                        "Model attempt failed, advancing fallback chain"
                    );
                    tried.push(model.clone());
                }
                Err(e) => {
                    tracing::error!(model = %model, error = %e, "Model call failed");
                    return Err(e);
                }
            }
        }

        Err(LlmError::AllModelsExhausted { tried })
    }

    /// Open a tool-enabled chat session backed by this executor.
    ///
    /// The session's sends each run the full chain, so a recoverable
    /// failure mid-conversation advances models without losing history.
    pub fn create_session(
        &self,
        tools: Vec<ToolDefinition>,
        system_instruction: impl Into<String>,
    ) -> ChatSession {
        ChatSession::new(self.clone(), tools, Some(system_instruction.into()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
