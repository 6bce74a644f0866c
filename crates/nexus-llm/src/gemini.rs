//! Gemini REST backend.
//!
//! Talks to the `generateContent` endpoint. Quota exhaustion (HTTP 429 or a
//! `RESOURCE_EXHAUSTED` error status) maps to [`LlmError::QuotaExhausted`]
//! and a request deadline to [`LlmError::Timeout`], both of which let the
//! fallback executor advance its chain; everything else is fatal for the
//! calling request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::backend::GenerativeBackend;
use crate::error::{LlmError, Result};
use crate::types::{FunctionCall, FunctionResponse, ModelRequest, ModelResponse, Part, Turn, TurnRole};

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key. `None` means unconfigured; calls will fail with a config
    /// error rather than at client construction.
    pub api_key: Option<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GeminiConfig {
    /// Create a configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Create a configuration from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            LlmError::Config("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Gemini REST client implementing [`GenerativeBackend`].
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Config("Gemini API key is not configured".to_string()))
    }

    /// Handle a successful response.
    async fn handle_response(response: Response) -> Result<GeminiResponse> {
        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let body = response.text().await?;
        let parsed: GeminiResponse = serde_json::from_str(&body)?;
        Ok(parsed)
    }

    /// Handle an error response.
    async fn handle_error_response(response: Response) -> LlmError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<GeminiErrorResponse>(&body) {
            Ok(parsed) => classify_error(status, parsed.error.message, &parsed.error.status),
            Err(_) => classify_error(status, format!("HTTP {}: {}", status, body), ""),
        }
    }
}

/// Map an HTTP status and provider error body to an error variant.
fn classify_error(status: StatusCode, message: String, api_status: &str) -> LlmError {
    if status == StatusCode::TOO_MANY_REQUESTS || api_status == "RESOURCE_EXHAUSTED" {
        LlmError::QuotaExhausted(message)
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        LlmError::Auth(message)
    } else if status.is_server_error() {
        LlmError::Api(format!("Server error: {}", message))
    } else {
        LlmError::Api(message)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(&self, model: &str, request: &ModelRequest) -> Result<ModelResponse> {
        let api_key = self.api_key()?.to_string();
        let wire_request = GeminiRequest::from(request);

        tracing::debug!(
            backend = %self.name(),
            model,
            turns = wire_request.contents.len(),
            tools = wire_request
                .tools
                .as_ref()
                .map(|groups| groups.iter().map(|g| g.function_declarations.len()).sum::<usize>())
                .unwrap_or(0),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.generate_url(model))
            .query(&[("key", api_key.as_str())])
            .json(&wire_request)
            .send()
            .await?;

        let parsed = Self::handle_response(response).await?;
        parsed.into_model_response(model)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiToolGroup>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiToolGroup {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[serde(default)]
    status: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

impl From<&ModelRequest> for GeminiRequest {
    fn from(request: &ModelRequest) -> Self {
        let contents = request.turns.iter().map(GeminiContent::from_turn).collect();

        let system_instruction = request.system_instruction.as_ref().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart::from_text(text.clone())],
        });

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![GeminiToolGroup {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|tool| GeminiFunctionDeclaration {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    })
                    .collect(),
            }])
        };

        Self {
            contents,
            system_instruction,
            tools,
        }
    }
}

impl GeminiContent {
    fn from_turn(turn: &Turn) -> Self {
        let role = match turn.role {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        };

        Self {
            role: Some(role.to_string()),
            parts: turn.parts.iter().map(GeminiPart::from_part).collect(),
        }
    }
}

impl GeminiPart {
    fn from_text(text: String) -> Self {
        Self {
            text: Some(text),
            function_call: None,
            function_response: None,
        }
    }

    fn from_part(part: &Part) -> Self {
        match part {
            Part::Text { text } => Self::from_text(text.clone()),
            Part::FunctionCall { call } => Self {
                text: None,
                function_call: Some(GeminiFunctionCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                function_response: None,
            },
            Part::FunctionResponse { response } => Self {
                text: None,
                function_call: None,
                function_response: Some(GeminiFunctionResponse {
                    name: response.name.clone(),
                    response: response.response.clone(),
                }),
            },
        }
    }

    fn into_part(self) -> Option<Part> {
        if let Some(text) = self.text {
            Some(Part::Text { text })
        } else if let Some(call) = self.function_call {
            Some(Part::FunctionCall {
                call: FunctionCall {
                    name: call.name,
                    args: call.args,
                },
            })
        } else if let Some(response) = self.function_response {
            Some(Part::FunctionResponse {
                response: FunctionResponse {
                    name: response.name,
                    response: response.response,
                },
            })
        } else {
            None
        }
    }
}

impl GeminiResponse {
    fn into_model_response(self, model: &str) -> Result<ModelResponse> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Api("Response contained no candidates".to_string()))?;

        let parts = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(GeminiPart::into_part)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ModelResponse::new(model, parts))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolDefinition;
    use serde_json::json;

    #[test]
    fn test_request_conversion_includes_system_and_tools() {
        let request = ModelRequest::from_text("find something")
            .with_system_instruction("use tools first")
            .with_tools(vec![ToolDefinition {
                name: "lookup".to_string(),
                description: "Look things up".to_string(),
                parameters: json!({"type": "object"}),
            }]);

        let wire = GeminiRequest::from(&request);

        assert_eq!(wire.contents.len(), 1);
        assert_eq!(wire.contents[0].role.as_deref(), Some("user"));
        assert!(wire.system_instruction.is_some());

        let groups = wire.tools.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].function_declarations.len(), 1);
        assert_eq!(groups[0].function_declarations[0].name, "lookup");
    }

    #[test]
    fn test_request_omits_tools_when_empty() {
        let wire = GeminiRequest::from(&ModelRequest::from_text("hi"));
        assert!(wire.tools.is_none());

        let serialized = serde_json::to_string(&wire).unwrap();
        assert!(!serialized.contains("tools"));
        assert!(!serialized.contains("systemInstruction"));
    }

    #[test]
    fn test_response_parsing_text_part() {
        let body = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "an answer"}]}}
            ]
        }"#;

        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        let response = parsed.into_model_response("gemini-2.5-flash").unwrap();

        assert_eq!(response.model, "gemini-2.5-flash");
        assert_eq!(response.text(), "an answer");
        assert!(!response.has_function_calls());
    }

    #[test]
    fn test_response_parsing_function_call_part() {
        let body = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [
                    {"functionCall": {"name": "lookup", "args": {"query": "techflow"}}}
                ]}}
            ]
        }"#;

        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        let response = parsed.into_model_response("gemini-2.5-flash").unwrap();

        let calls = response.function_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "lookup");
        assert_eq!(calls[0].args["query"], "techflow");
    }

    #[test]
    fn test_response_with_no_candidates_is_an_error() {
        let parsed: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let err = parsed.into_model_response("m").unwrap_err();
        assert!(matches!(err, LlmError::Api(_)));
    }

    #[test]
    fn test_classify_error_quota_by_status_code() {
        let err = classify_error(StatusCode::TOO_MANY_REQUESTS, "slow down".to_string(), "");
        assert!(err.is_quota_exhausted());
    }

    #[test]
    fn test_classify_error_quota_by_api_status() {
        let err = classify_error(
            StatusCode::BAD_REQUEST,
            "quota".to_string(),
            "RESOURCE_EXHAUSTED",
        );
        assert!(err.is_quota_exhausted());
    }

    #[test]
    fn test_classify_error_auth_and_server() {
        assert!(matches!(
            classify_error(StatusCode::FORBIDDEN, "no".to_string(), ""),
            LlmError::Auth(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, "oops".to_string(), ""),
            LlmError::Api(_)
        ));
    }

    #[test]
    fn test_generate_url() {
        let backend = GeminiBackend::new(GeminiConfig::new("key")).unwrap();
        assert_eq!(
            backend.generate_url("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_missing_api_key_is_a_config_error() {
        let backend = GeminiBackend::new(GeminiConfig::default()).unwrap();
        assert!(matches!(
            backend.api_key().unwrap_err(),
            LlmError::Config(_)
        ));
    }
}
