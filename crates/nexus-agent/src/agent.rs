//! The query orchestrator.
//!
//! [`Agent::run_query`] drives one query end to end and emits the events
//! described in [`crate::events`]: an intent gate decides between a plain
//! conversational reply and the tool-calling research loop, tools run
//! sequentially with a status record before each call and an artifact
//! record after, and the stream always ends with exactly one terminal
//! event. The caller only consumes the stream; all model traffic goes
//! through the fallback executor.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::Stream;
use serde_json::json;
use uuid::Uuid;

use nexus_llm::{
    FallbackExecutor, FallbackPolicy, FunctionCall, FunctionResponse, ModelRequest, SharedBackend,
};
use nexus_store::EntityStore;

use crate::error::{AgentError, Result};
use crate::events::{AnswerFormat, ArtifactStatus, QueryEvent};
use crate::gatekeeper::{self, Intent};
use crate::tool::{ToolContext, ToolRegistry, ToolResult};
use crate::tools::{EntitySearchTool, SerperClient, SerperConfig, WebSearchTool};

const SEARCH_SYSTEM_INSTRUCTION: &str = "You are a research assistant for a sales platform. \
    To answer the user's request, first call search_local_entities to check the internal \
    database. If it returns no useful records, call search_web to look on the public web. \
    When you have enough information, reply with a JSON array of candidate objects, each \
    with the fields name, role, company, location, and summary. Reply with the JSON array \
    only, no surrounding prose.";

const CHAT_SYSTEM_INSTRUCTION: &str = "You are a friendly assistant for a sales platform. \
    Respond conversationally and briefly.";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tunables for the conversation loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Upper bound on tool rounds per query. A round is one model turn
    /// that requests tools plus the batch of executions answering it.
    pub max_tool_rounds: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_tool_rounds: 6 }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────────────────────────────────────

/// Drives queries against the model, tools, and entity store.
///
/// Cheap to clone; per-query state lives inside the stream returned by
/// [`Agent::run_query`].
#[derive(Clone)]
pub struct Agent {
    executor: FallbackExecutor,
    tools: Arc<ToolRegistry>,
    store: Arc<EntityStore>,
    config: AgentConfig,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Start building an agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// The entity store this agent queries.
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Run one query to completion, yielding its event stream.
    ///
    /// The stream ends with exactly one terminal event. Dropping it stops
    /// any further model or tool calls.
    pub fn run_query(&self, query: impl Into<String>) -> Pin<Box<dyn Stream<Item = QueryEvent> + Send>> {
        let agent = self.clone();
        let query = query.into();

        Box::pin(stream! {
            let query_id = Uuid::new_v4();
            tracing::info!(%query_id, query = %query, "Query started");

            yield QueryEvent::status("Analyzing your request...");

            let classification = gatekeeper::classify(&agent.executor, &query).await;
            if let Some(note) = classification.note {
                yield QueryEvent::status(note);
            }

            match classification.intent {
                Intent::Chat => {
                    let request = ModelRequest::from_text(query.clone())
                        .with_system_instruction(CHAT_SYSTEM_INSTRUCTION);

                    match agent.executor.generate(&request).await {
                        Ok(response) => {
                            tracing::info!(%query_id, "Chat reply ready");
                            yield QueryEvent::answer(response.text(), AnswerFormat::Text);
                        }
                        Err(e) => {
                            tracing::error!(%query_id, error = %e, "Chat generation failed");
                            yield QueryEvent::error(e.to_string());
                        }
                    }
                }
                Intent::Search => {
                    yield QueryEvent::status("Searching connected sources...");

                    let ctx = ToolContext::new(query_id, agent.store.clone());
                    let mut session = agent.executor.create_session(
                        agent.tools.to_llm_definitions(),
                        SEARCH_SYSTEM_INSTRUCTION,
                    );

                    let mut response = match session.send_text(query.clone()).await {
                        Ok(response) => response,
                        Err(e) => {
                            tracing::error!(%query_id, error = %e, "Initial model turn failed");
                            yield QueryEvent::error(e.to_string());
                            return;
                        }
                    };

                    let mut rounds = 0u32;
                    loop {
                        if !response.has_function_calls() {
                            tracing::info!(%query_id, rounds, "Search answer ready");
                            yield QueryEvent::answer(response.text(), AnswerFormat::Json);
                            return;
                        }

                        rounds += 1;
                        if rounds > agent.config.max_tool_rounds {
                            tracing::warn!(
                                %query_id,
                                limit = agent.config.max_tool_rounds,
                                "Tool round limit reached"
                            );
                            yield QueryEvent::error(format!(
                                "Stopped after {} tool rounds without a final answer",
                                agent.config.max_tool_rounds
                            ));
                            return;
                        }

                        let calls: Vec<FunctionCall> =
                            response.function_calls().into_iter().cloned().collect();
                        let mut outcomes = Vec::with_capacity(calls.len());

                        for call in calls {
                            let call_query = call
                                .args
                                .get("query")
                                .and_then(|v| v.as_str())
                                .unwrap_or_default()
                                .to_string();

                            yield QueryEvent::status(format!("Calling {}...", call.name));

                            let (result, status) = agent.invoke_tool(&ctx, &call).await;
                            let rendered = result.to_llm_content();

                            tracing::debug!(
                                %query_id,
                                tool = %call.name,
                                ?status,
                                round = rounds,
                                "Tool executed"
                            );

                            yield QueryEvent::ToolArtifact {
                                tool_name: call.name.clone(),
                                query: call_query,
                                status,
                                result: rendered.clone(),
                            };

                            outcomes.push(FunctionResponse {
                                name: call.name,
                                response: json!({ "content": rendered }),
                            });
                        }

                        response = match session.send_function_responses(outcomes).await {
                            Ok(next) => next,
                            Err(e) => {
                                tracing::error!(%query_id, error = %e, "Model turn failed mid-loop");
                                yield QueryEvent::error(e.to_string());
                                return;
                            }
                        };
                    }
                }
            }
        })
    }

    /// Run one tool call. Every failure becomes a failed artifact rather
    /// than ending the query.
    async fn invoke_tool(&self, ctx: &ToolContext, call: &FunctionCall) -> (ToolResult, ArtifactStatus) {
        match self.tools.execute(&call.name, call.args.clone(), ctx).await {
            Ok(result) => {
                let status = self.tools.artifact_status(&call.name, &result);
                (result, status)
            }
            Err(AgentError::ToolNotFound(name)) => {
                tracing::warn!(tool = %name, "Model requested an unknown tool");
                (
                    ToolResult::error(format!("Tool '{name}' is not available")),
                    ArtifactStatus::Fail,
                )
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool execution failed");
                (ToolResult::error(e.to_string()), ArtifactStatus::Fail)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`Agent`].
pub struct AgentBuilder {
    backend: Option<SharedBackend>,
    policy: Option<FallbackPolicy>,
    store: Option<Arc<EntityStore>>,
    registry: Option<ToolRegistry>,
    serper: SerperConfig,
    config: AgentConfig,
}

impl AgentBuilder {
    /// Create a builder with default configuration. Web search stays
    /// keyless until [`AgentBuilder::with_serper_config`] provides one.
    pub fn new() -> Self {
        Self {
            backend: None,
            policy: None,
            store: None,
            registry: None,
            serper: SerperConfig::default(),
            config: AgentConfig::default(),
        }
    }

    /// Set the model backend. Required.
    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the model fallback policy. Required.
    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set the entity store. Required.
    pub fn with_store(mut self, store: Arc<EntityStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the default tool registry.
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Configure the web search provider used by the default registry.
    pub fn with_serper_config(mut self, config: SerperConfig) -> Self {
        self.serper = config;
        self
    }

    /// Override the tool round cap.
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: u32) -> Self {
        self.config.max_tool_rounds = max_tool_rounds;
        self
    }

    /// Build the agent. The default registry carries the local entity
    /// search and the web search tools.
    pub fn build(self) -> Result<Agent> {
        let backend = self
            .backend
            .ok_or_else(|| AgentError::config("Agent requires a model backend"))?;
        let policy = self
            .policy
            .ok_or_else(|| AgentError::config("Agent requires a fallback policy"))?;
        let store = self
            .store
            .ok_or_else(|| AgentError::config("Agent requires an entity store"))?;

        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                let mut registry = ToolRegistry::new();
                registry.register(EntitySearchTool::new());
                registry.register(WebSearchTool::new(SerperClient::new(self.serper)?));
                registry
            }
        };

        Ok(Agent {
            executor: FallbackExecutor::new(backend, policy),
            tools: Arc::new(registry),
            store,
            config: self.config,
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    use nexus_llm::{LlmError, MockBackend, ModelResponse, Part};

    fn quota_err() -> LlmError {
        LlmError::QuotaExhausted("429 Too Many Requests".to_string())
    }

    fn search_label() -> nexus_llm::Result<ModelResponse> {
        Ok(ModelResponse::text_reply("m1", "SEARCH"))
    }

    fn tool_call(tool: &str, query: &str) -> nexus_llm::Result<ModelResponse> {
        Ok(ModelResponse::new(
            "m1",
            vec![Part::function_call(tool, json!({ "query": query }))],
        ))
    }

    fn text_reply(text: &str) -> nexus_llm::Result<ModelResponse> {
        Ok(ModelResponse::text_reply("m1", text))
    }

    fn build_agent(
        outcomes: Vec<nexus_llm::Result<ModelResponse>>,
        models: &[&str],
    ) -> (Agent, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::scripted(outcomes));
        let store = Arc::new(EntityStore::open_in_memory().unwrap());
        store.seed().unwrap();

        let agent = Agent::builder()
            .with_backend(backend.clone())
            .with_policy(
                FallbackPolicy::new(models.iter().map(|m| m.to_string()).collect()).unwrap(),
            )
            .with_store(store)
            .build()
            .unwrap();

        (agent, backend)
    }

    async fn collect_events(agent: &Agent, query: &str) -> Vec<QueryEvent> {
        agent.run_query(query).collect().await
    }

    fn assert_single_terminal(events: &[QueryEvent]) {
        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminals, 1, "expected one terminal event in {events:?}");
        assert!(
            events.last().unwrap().is_terminal(),
            "terminal event must come last in {events:?}"
        );
    }

    fn artifacts(events: &[QueryEvent]) -> Vec<&QueryEvent> {
        events
            .iter()
            .filter(|e| matches!(e, QueryEvent::ToolArtifact { .. }))
            .collect()
    }

    #[tokio::test]
    async fn chat_query_yields_single_text_answer() {
        let (agent, _) = build_agent(
            vec![text_reply("CHAT"), text_reply("Hello! How can I help?")],
            &["m1"],
        );

        let events = collect_events(&agent, "hello").await;

        assert_single_terminal(&events);
        assert!(artifacts(&events).is_empty());
        assert_eq!(
            events.last().unwrap(),
            &QueryEvent::answer("Hello! How can I help?", AnswerFormat::Text)
        );
    }

    #[tokio::test]
    async fn chat_failure_surfaces_exhausted_chain() {
        let (agent, backend) = build_agent(
            vec![text_reply("CHAT"), Err(quota_err()), Err(quota_err())],
            &["m1", "m2"],
        );

        let events = collect_events(&agent, "hello").await;

        assert_single_terminal(&events);
        let QueryEvent::Error { message } = events.last().unwrap() else {
            panic!("expected a terminal error, got {events:?}");
        };
        assert!(message.contains("All models exhausted"));
        // Classification once, then both chain entries for the reply.
        assert_eq!(backend.models_tried(), vec!["m1", "m1", "m2"]);
    }

    #[tokio::test]
    async fn search_query_runs_local_tool_then_answers_json() {
        let (agent, _) = build_agent(
            vec![
                search_label(),
                tool_call("search_local_entities", "elena"),
                text_reply(r#"[{"name": "Elena Silva", "role": "VP Sales"}]"#),
            ],
            &["m1"],
        );

        let events = collect_events(&agent, "find elena").await;

        assert_single_terminal(&events);

        let found = artifacts(&events);
        assert_eq!(found.len(), 1);
        let QueryEvent::ToolArtifact {
            tool_name,
            query,
            status,
            result,
        } = found[0]
        else {
            unreachable!();
        };
        assert_eq!(tool_name, "search_local_entities");
        assert_eq!(query, "elena");
        assert_eq!(*status, ArtifactStatus::Success);
        assert!(result.contains("Elena Silva"));

        let QueryEvent::Answer { content, format } = events.last().unwrap() else {
            panic!("expected an answer");
        };
        assert_eq!(*format, AnswerFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(content).unwrap();
        assert_eq!(parsed[0]["name"], "Elena Silva");
    }

    #[tokio::test]
    async fn status_precedes_every_tool_call() {
        let (agent, _) = build_agent(
            vec![
                search_label(),
                tool_call("search_local_entities", "elena"),
                text_reply("[]"),
            ],
            &["m1"],
        );

        let events = collect_events(&agent, "find elena").await;

        let artifact_idx = events
            .iter()
            .position(|e| matches!(e, QueryEvent::ToolArtifact { .. }))
            .unwrap();
        let QueryEvent::Status { message } = &events[artifact_idx - 1] else {
            panic!("expected a status immediately before the artifact");
        };
        assert!(message.contains("search_local_entities"));
    }

    #[tokio::test]
    async fn sentinel_lookup_is_a_failed_artifact() {
        let (agent, _) = build_agent(
            vec![
                search_label(),
                tool_call("search_local_entities", "nobody by this name"),
                text_reply("[]"),
            ],
            &["m1"],
        );

        let events = collect_events(&agent, "find nobody").await;

        let found = artifacts(&events);
        let QueryEvent::ToolArtifact { status, result, .. } = found[0] else {
            unreachable!();
        };
        assert_eq!(*status, ArtifactStatus::Fail);
        assert_eq!(result, "No records found");
        // The loop still finishes with an answer.
        assert_single_terminal(&events);
        assert!(matches!(events.last().unwrap(), QueryEvent::Answer { .. }));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_failed_artifact_and_loop_continues() {
        let (agent, _) = build_agent(
            vec![
                search_label(),
                tool_call("search_magic", "anything"),
                text_reply("[]"),
            ],
            &["m1"],
        );

        let events = collect_events(&agent, "find anything").await;

        assert_single_terminal(&events);
        let found = artifacts(&events);
        let QueryEvent::ToolArtifact {
            tool_name,
            status,
            result,
            ..
        } = found[0]
        else {
            unreachable!();
        };
        assert_eq!(tool_name, "search_magic");
        assert_eq!(*status, ArtifactStatus::Fail);
        assert!(result.contains("not available"));
        assert!(matches!(events.last().unwrap(), QueryEvent::Answer { .. }));
    }

    #[tokio::test]
    async fn round_cap_stops_a_runaway_loop() {
        let backend = Arc::new(MockBackend::scripted(vec![
            search_label(),
            tool_call("search_local_entities", "elena"),
            tool_call("search_local_entities", "elena"),
            tool_call("search_local_entities", "elena"),
        ]));
        let store = Arc::new(EntityStore::open_in_memory().unwrap());
        store.seed().unwrap();

        let agent = Agent::builder()
            .with_backend(backend)
            .with_policy(FallbackPolicy::new(vec!["m1".to_string()]).unwrap())
            .with_store(store)
            .with_max_tool_rounds(2)
            .build()
            .unwrap();

        let events = collect_events(&agent, "find elena").await;

        assert_single_terminal(&events);
        assert_eq!(artifacts(&events).len(), 2);
        let QueryEvent::Error { message } = events.last().unwrap() else {
            panic!("expected a terminal error");
        };
        assert!(message.contains("2 tool rounds"));
    }

    #[tokio::test]
    async fn model_fault_mid_loop_keeps_earlier_artifacts() {
        let (agent, _) = build_agent(
            vec![
                search_label(),
                tool_call("search_local_entities", "elena"),
                Err(LlmError::Auth("bad api key".to_string())),
            ],
            &["m1"],
        );

        let events = collect_events(&agent, "find elena").await;

        assert_single_terminal(&events);
        assert_eq!(artifacts(&events).len(), 1);
        assert!(matches!(events.last().unwrap(), QueryEvent::Error { .. }));
    }

    #[tokio::test]
    async fn quota_fallback_recovers_without_surfacing() {
        let (agent, backend) = build_agent(
            vec![
                Err(quota_err()),
                text_reply("CHAT"),
                text_reply("hi there"),
            ],
            &["m1", "m2"],
        );

        let events = collect_events(&agent, "hello").await;

        assert_single_terminal(&events);
        assert_eq!(
            events.last().unwrap(),
            &QueryEvent::answer("hi there", AnswerFormat::Text)
        );
        // Classification fell to m2, the reply started from m1 again.
        assert_eq!(backend.models_tried(), vec!["m1", "m2", "m1"]);
    }

    #[tokio::test]
    async fn classifier_failure_fails_open_with_a_note() {
        let (agent, _) = build_agent(
            vec![
                Err(LlmError::Auth("bad api key".to_string())),
                text_reply("Happy to help!"),
            ],
            &["m1"],
        );

        let events = collect_events(&agent, "find elena").await;

        assert_single_terminal(&events);
        assert!(events.iter().any(|e| matches!(
            e,
            QueryEvent::Status { message } if message.contains("conversationally")
        )));
        assert_eq!(
            events.last().unwrap(),
            &QueryEvent::answer("Happy to help!", AnswerFormat::Text)
        );
    }

    #[tokio::test]
    async fn parallel_calls_run_sequentially_and_answer_as_one_batch() {
        let two_calls = Ok(ModelResponse::new(
            "m1",
            vec![
                Part::function_call("search_local_entities", json!({ "query": "techflow" })),
                Part::function_call("search_web", json!({ "query": "techflow" })),
            ],
        ));
        let (agent, backend) = build_agent(
            vec![search_label(), two_calls, text_reply("[]")],
            &["m1"],
        );

        let events = collect_events(&agent, "find techflow").await;

        assert_single_terminal(&events);
        let found = artifacts(&events);
        assert_eq!(found.len(), 2);
        let QueryEvent::ToolArtifact { tool_name: first, .. } = found[0] else {
            unreachable!();
        };
        let QueryEvent::ToolArtifact { tool_name: second, .. } = found[1] else {
            unreachable!();
        };
        assert_eq!(first, "search_local_entities");
        assert_eq!(second, "search_web");

        // Both outcomes return to the model in a single function-response
        // turn: user query, model calls, then the batch.
        let requests = backend.requests();
        let (_, batch_request) = &requests[2];
        assert_eq!(batch_request.turns.len(), 3);
        assert_eq!(batch_request.turns[2].parts.len(), 2);
    }

    #[tokio::test]
    async fn builder_requires_backend_policy_and_store() {
        let err = Agent::builder().build().unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
