//! Chat session bound to one query.
//!
//! The session owns an append-only turn history and lives only as long as
//! the conversation it serves. Every send replays the full history through
//! the fallback executor.

use crate::error::Result;
use crate::fallback::FallbackExecutor;
use crate::types::{FunctionResponse, ModelRequest, ModelResponse, ToolDefinition, Turn};

/// A stateful conversation with tool support.
pub struct ChatSession {
    executor: FallbackExecutor,
    tools: Vec<ToolDefinition>,
    system_instruction: Option<String>,
    history: Vec<Turn>,
}

impl ChatSession {
    pub(crate) fn new(
        executor: FallbackExecutor,
        tools: Vec<ToolDefinition>,
        system_instruction: Option<String>,
    ) -> Self {
        Self {
            executor,
            tools,
            system_instruction,
            history: Vec::new(),
        }
    }

    /// Send a user text message and return the model's reply.
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<ModelResponse> {
        self.send_turn(Turn::user(text)).await
    }

    /// Return tool outcomes to the model as one function-response turn.
    ///
    /// All outcomes from one model turn go back together; the provider
    /// expects the full batch answered before it continues.
    pub async fn send_function_responses(
        &mut self,
        responses: Vec<FunctionResponse>,
    ) -> Result<ModelResponse> {
        self.send_turn(Turn::function_responses(responses)).await
    }

    async fn send_turn(&mut self, turn: Turn) -> Result<ModelResponse> {
        self.history.push(turn);

        let mut request = ModelRequest::new(self.history.clone()).with_tools(self.tools.clone());
        if let Some(instruction) = &self.system_instruction {
            request = request.with_system_instruction(instruction.clone());
        }

        let response = self.executor.generate(&request).await?;
        self.history.push(response.clone().into_turn());
        Ok(response)
    }

    /// The conversation history so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }
}
