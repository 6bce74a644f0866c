//! Local entity lookup tool.

use async_trait::async_trait;
use serde_json::json;

use nexus_store::EntitySummary;

use crate::error::Result;
use crate::events::ArtifactStatus;
use crate::tool::{ParamExt, Tool, ToolContext, ToolResult};

/// Sentinel text returned when no entity matches the query.
pub const NO_RECORDS_SENTINEL: &str = "No records found";

/// Searches the local store of people and businesses.
#[derive(Debug, Default)]
pub struct EntitySearchTool;

impl EntitySearchTool {
    /// Create the tool.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for EntitySearchTool {
    fn name(&self) -> &str {
        "search_local_entities"
    }

    fn description(&self) -> &str {
        "Search the local database of people and businesses. The query is matched as a \
         case-insensitive substring against name, role, company, industry, location, and \
         source. Use this before searching the web."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Text to match against entity fields, e.g. a name, company, or industry"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let query = match params.required_str("query", "provide the text to search for") {
            Ok(query) => query,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };

        let entities = match ctx.store.find(query) {
            Ok(entities) => entities,
            Err(e) => {
                tracing::warn!(query_id = %ctx.query_id, query, error = %e, "Entity lookup failed");
                return Ok(ToolResult::error(format!("Entity lookup failed: {e}")));
            }
        };

        tracing::debug!(
            query_id = %ctx.query_id,
            query,
            matches = entities.len(),
            "Entity search complete"
        );

        if entities.is_empty() {
            return Ok(ToolResult::text(NO_RECORDS_SENTINEL));
        }

        let summaries: Vec<EntitySummary> = entities.iter().map(EntitySummary::from).collect();
        Ok(ToolResult::json(serde_json::to_value(summaries)?))
    }

    // The sentinel is a successful execution that still counts as a failed
    // lookup.
    fn artifact_status(&self, result: &ToolResult) -> ArtifactStatus {
        match result {
            ToolResult::Text { content } if content == NO_RECORDS_SENTINEL => ArtifactStatus::Fail,
            ToolResult::Error { .. } => ArtifactStatus::Fail,
            _ => ArtifactStatus::Success,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
