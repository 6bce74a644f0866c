//! Core types for model requests and responses.
//!
//! These types follow the generateContent turn/part shape while staying
//! provider-agnostic, so the orchestrator never depends on a concrete
//! backend's wire format.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Turns and Parts
// ─────────────────────────────────────────────────────────────────────────────

/// The author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One piece of a turn's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Part {
    /// Plain text.
    Text { text: String },
    /// A model-issued request to invoke a named tool.
    FunctionCall { call: FunctionCall },
    /// A tool's outcome, returned to the model.
    FunctionResponse { response: FunctionResponse },
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Create a function-call part.
    pub fn function_call(name: impl Into<String>, args: serde_json::Value) -> Self {
        Part::FunctionCall {
            call: FunctionCall {
                name: name.into(),
                args,
            },
        }
    }

    /// Create a function-response part.
    pub fn function_response(name: impl Into<String>, response: serde_json::Value) -> Self {
        Part::FunctionResponse {
            response: FunctionResponse {
                name: name.into(),
                response,
            },
        }
    }
}

/// A model-issued tool invocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Tool name; must match a registered tool.
    pub name: String,
    /// Argument name to value mapping.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// A tool outcome paired back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Name of the tool that produced this outcome.
    pub name: String,
    /// The outcome payload.
    pub response: serde_json::Value,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

impl Turn {
    /// A user turn with text content.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            parts: vec![Part::text(text)],
        }
    }

    /// A model turn with text content.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            parts: vec![Part::text(text)],
        }
    }

    /// A model turn with arbitrary parts.
    pub fn model_parts(parts: Vec<Part>) -> Self {
        Self {
            role: TurnRole::Model,
            parts,
        }
    }

    /// A user turn carrying tool outcomes back to the model.
    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: TurnRole::User,
            parts: responses
                .into_iter()
                .map(|response| Part::FunctionResponse { response })
                .collect(),
        }
    }

    /// Concatenated text content of this turn.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// A tool capability advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name the model uses to invoke it.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// A generation request.
///
/// The model identifier is deliberately absent: the fallback executor
/// supplies it per attempt while walking its chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Conversation turns, oldest first.
    pub turns: Vec<Turn>,

    /// System instruction (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// Tools available for the model to call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl ModelRequest {
    /// Create a request from existing turns.
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            turns,
            system_instruction: None,
            tools: Vec::new(),
        }
    }

    /// Create a single-turn request from user text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Turn::user(text)])
    }

    /// Set the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Add tool definitions to the request.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

/// A model's reply: text parts, function calls, or a mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The model that produced this response.
    pub model: String,
    /// Response content parts.
    pub parts: Vec<Part>,
}

impl ModelResponse {
    /// Create a response from parts.
    pub fn new(model: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            model: model.into(),
            parts,
        }
    }

    /// Create a plain-text response.
    pub fn text_reply(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(model, vec![Part::text(text)])
    }

    /// Concatenated text content of the response.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Function calls requested by the model, in response order.
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionCall { call } => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Whether the model requested any tool invocation.
    pub fn has_function_calls(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, Part::FunctionCall { .. }))
    }

    /// Convert into a model turn for conversation history.
    pub fn into_turn(self) -> Turn {
        Turn::model_parts(self.parts)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_text_concatenates_text_parts() {
        let turn = Turn::model_parts(vec![
            Part::text("Hello"),
            Part::function_call("lookup", json!({"query": "x"})),
            Part::text(", world"),
        ]);

        assert_eq!(turn.text(), "Hello, world");
    }

    #[test]
    fn test_response_function_calls_preserve_order() {
        let response = ModelResponse::new(
            "test-model",
            vec![
                Part::function_call("first", json!({"a": 1})),
                Part::function_call("second", json!({"b": 2})),
            ],
        );

        assert!(response.has_function_calls());
        let calls = response.function_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "first");
        assert_eq!(calls[1].name, "second");
    }

    #[test]
    fn test_text_reply_has_no_function_calls() {
        let response = ModelResponse::text_reply("test-model", "done");

        assert!(!response.has_function_calls());
        assert_eq!(response.text(), "done");
    }

    #[test]
    fn test_function_responses_turn_is_user_role() {
        let turn = Turn::function_responses(vec![FunctionResponse {
            name: "lookup".to_string(),
            response: json!({"content": "ok"}),
        }]);

        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.parts.len(), 1);
    }

    #[test]
    fn test_request_builder() {
        let request = ModelRequest::from_text("hi")
            .with_system_instruction("be brief")
            .with_tools(vec![ToolDefinition {
                name: "lookup".to_string(),
                description: "Look things up".to_string(),
                parameters: json!({"type": "object"}),
            }]);

        assert_eq!(request.turns.len(), 1);
        assert_eq!(request.system_instruction.as_deref(), Some("be brief"));
        assert_eq!(request.tools.len(), 1);
    }
}
