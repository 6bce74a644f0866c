//! Tool trait, results, and the registry the conversation loop draws from.
//!
//! Tools receive their dependencies through a per-query [`ToolContext`]
//! rather than capturing them at construction, so a single registry can
//! serve every query. A tool signals domain failures by returning a
//! [`ToolResult`] (possibly [`ToolResult::Error`]), not by returning `Err`:
//! the loop feeds every outcome back to the model and keeps going.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use nexus_llm::ToolDefinition;
use nexus_store::EntityStore;

use crate::error::{AgentError, Result};
use crate::events::ArtifactStatus;

// ─────────────────────────────────────────────────────────────────────────────
// Parameter validation
// ─────────────────────────────────────────────────────────────────────────────

/// Validation failure for a tool parameter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParameterValidationError {
    /// A required parameter was not provided.
    #[error("Missing required parameter '{name}': {hint}")]
    MissingRequired {
        /// Parameter name.
        name: &'static str,
        /// What the caller should pass.
        hint: &'static str,
    },

    /// A parameter had the wrong JSON type.
    #[error("Parameter '{name}' must be {expected}, got {actual}")]
    InvalidType {
        /// Parameter name.
        name: &'static str,
        /// Expected JSON type.
        expected: &'static str,
        /// JSON type that was actually provided.
        actual: String,
    },
}

impl ParameterValidationError {
    /// Missing required parameter.
    pub fn missing(name: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { name, hint }
    }

    /// Wrong parameter type.
    pub fn invalid_type(name: &'static str, expected: &'static str, actual: &str) -> Self {
        Self::InvalidType {
            name,
            expected,
            actual: actual.to_string(),
        }
    }
}

/// Result type for parameter extraction.
pub type ParamResult<T> = std::result::Result<T, ParameterValidationError>;

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Typed accessors over a tool's `params` JSON object.
pub trait ParamExt {
    /// A string parameter that must be present and non-empty.
    fn required_str(&self, name: &'static str, hint: &'static str) -> ParamResult<&str>;

    /// A string parameter that may be absent.
    fn optional_str(&self, name: &'static str) -> Option<&str>;
}

impl ParamExt for serde_json::Value {
    fn required_str(&self, name: &'static str, hint: &'static str) -> ParamResult<&str> {
        match self.get(name) {
            None | Some(serde_json::Value::Null) => {
                Err(ParameterValidationError::missing(name, hint))
            }
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
                Err(ParameterValidationError::missing(name, hint))
            }
            Some(serde_json::Value::String(s)) => Ok(s.as_str()),
            Some(other) => Err(ParameterValidationError::invalid_type(
                name,
                "a string",
                json_type_name(other),
            )),
        }
    }

    fn optional_str(&self, name: &'static str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool results
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResult {
    /// Plain text result.
    Text {
        /// The text content.
        content: String,
    },
    /// Structured JSON result.
    Json {
        /// The JSON content.
        content: serde_json::Value,
    },
    /// The tool itself failed.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl ToolResult {
    /// Create a text result.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Create a JSON result.
    pub fn json(content: serde_json::Value) -> Self {
        Self::Json { content }
    }

    /// Create an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Check if this result is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Render the result as the string handed back to the model. The same
    /// string is recorded on the query's tool_artifact event.
    pub fn to_llm_content(&self) -> String {
        match self {
            Self::Text { content } => content.clone(),
            Self::Json { content } => serde_json::to_string_pretty(content)
                .unwrap_or_else(|_| content.to_string()),
            Self::Error { message } => format!("Error: {message}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool trait and context
// ─────────────────────────────────────────────────────────────────────────────

/// Per-query dependencies handed to every tool invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Id of the query this invocation belongs to.
    pub query_id: Uuid,
    /// Entity store for local lookups.
    pub store: Arc<EntityStore>,
}

impl ToolContext {
    /// Create a context for one query.
    pub fn new(query_id: Uuid, store: Arc<EntityStore>) -> Self {
        Self { query_id, store }
    }
}

/// A capability the model can invoke during the conversation loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to invoke the tool.
    fn name(&self) -> &str;

    /// What the tool does, shown to the model.
    fn description(&self) -> &str;

    /// JSON schema for the tool's parameters.
    fn parameters(&self) -> serde_json::Value;

    /// Run the tool. Domain failures come back as [`ToolResult::Error`]
    /// (or a sentinel result); `Err` is reserved for faults the tool
    /// cannot express as a result.
    async fn execute(&self, params: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult>;

    /// Classify a result for the query's tool_artifact record. The default
    /// treats only [`ToolResult::Error`] as a failure; tools with sentinel
    /// outcomes override this.
    fn artifact_status(&self, result: &ToolResult) -> ArtifactStatus {
        if result.is_error() {
            ArtifactStatus::Fail
        } else {
            ArtifactStatus::Success
        }
    }

    /// Definition advertised to the model.
    fn to_llm_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool registry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous tool with the same name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register an already-shared tool.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check whether a tool is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for every registered tool, in name order so the model
    /// sees a stable listing.
    pub fn to_llm_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| tool.to_llm_definition())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Execute a tool by name.
    pub async fn execute(
        &self,
        name: &str,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        tool.execute(params, ctx).await
    }

    /// Classify a result using the owning tool's policy. Falls back to the
    /// default classification when the tool is unknown.
    pub fn artifact_status(&self, name: &str, result: &ToolResult) -> ArtifactStatus {
        match self.get(name) {
            Some(tool) => tool.artifact_status(result),
            None if result.is_error() => ArtifactStatus::Fail,
            None => ArtifactStatus::Success,
        }
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test support
// ─────────────────────────────────────────────────────────────────────────────

/// Scriptable tool for tests. Records every call it receives.
#[cfg(test)]
pub(crate) struct MockTool {
    name: String,
    response: std::sync::Mutex<Option<ToolResult>>,
    calls: std::sync::Mutex<Vec<serde_json::Value>>,
}

#[cfg(test)]
impl MockTool {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: std::sync::Mutex::new(None),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_response(self, response: ToolResult) -> Self {
        *self.response.lock().unwrap() = Some(response);
        self
    }

    pub(crate) fn calls(&self) -> Vec<serde_json::Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Mock tool for testing"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" }
            }
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolResult> {
        self.calls.lock().unwrap().push(params);
        Ok(self
            .response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| ToolResult::text("mock response")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
