//! Backend trait for model providers.
//!
//! [`GenerativeBackend`] is the capability interface the rest of the system
//! programs against. The model identifier is an argument to each call rather
//! than backend state, so the fallback executor can walk its chain over a
//! single backend instance.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{LlmError, Result};
use crate::types::{ModelRequest, ModelResponse};

// ─────────────────────────────────────────────────────────────────────────────
// Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Interface implemented by all model providers.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Run one generation call against the given model.
    async fn generate(&self, model: &str, request: &ModelRequest) -> Result<ModelResponse>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn GenerativeBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// A mock backend for testing purposes.
///
/// Returns pre-scripted outcomes in order, useful for deterministic testing
/// of the fallback chain and the tool-calling loop. Outcomes may be errors,
/// which is how quota exhaustion is scripted.
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    outcomes: std::sync::Mutex<Vec<Result<ModelResponse>>>,
    request_log: std::sync::Mutex<Vec<(String, ModelRequest)>>,
}

impl MockBackend {
    /// Create a mock backend returning the given responses in order.
    ///
    /// If more requests are made than outcomes available, an error is
    /// returned.
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    /// Create a mock backend with explicit per-call outcomes, including
    /// errors.
    pub fn scripted(outcomes: Vec<Result<ModelResponse>>) -> Self {
        Self {
            name: "mock".to_string(),
            outcomes: std::sync::Mutex::new(outcomes),
            request_log: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock backend with a single text response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![ModelResponse::text_reply("mock-model", text)])
    }

    /// All requests made to this backend, with the model each targeted.
    pub fn requests(&self) -> Vec<(String, ModelRequest)> {
        self.request_log.lock().unwrap().clone()
    }

    /// The number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().unwrap().len()
    }

    /// Model identifiers attempted, in call order.
    pub fn models_tried(&self) -> Vec<String> {
        self.request_log
            .lock()
            .unwrap()
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate(&self, model: &str, request: &ModelRequest) -> Result<ModelResponse> {
        self.request_log
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));

        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            return Err(LlmError::Api(
                "MockBackend: no more responses available".to_string(),
            ));
        }
        outcomes.remove(0)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
