//! Events emitted over the lifetime of one query.
//!
//! A query produces a totally ordered stream of [`QueryEvent`]s: any number
//! of status and tool-artifact records followed by exactly one terminal
//! record (an answer or an error). Each event serializes as a single JSON
//! object tagged by `type`, which is what goes over the wire as one NDJSON
//! line.

use serde::{Deserialize, Serialize};

/// Outcome classification of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    /// The tool produced a usable result.
    Success,
    /// The tool failed or produced nothing useful.
    Fail,
}

/// Content format of a terminal answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerFormat {
    /// Conversational prose.
    Text,
    /// A JSON document (possibly wrapped in markdown fences by the model).
    Json,
}

/// One record in a query's event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryEvent {
    /// Progress note for the caller's UI.
    Status {
        /// Human-readable progress message.
        message: String,
    },
    /// Outcome of one tool invocation.
    ToolArtifact {
        /// Name of the tool that ran.
        tool_name: String,
        /// Query argument the model passed to the tool.
        query: String,
        /// Whether the invocation produced a usable result.
        status: ArtifactStatus,
        /// Raw result text handed back to the model.
        result: String,
    },
    /// Terminal answer. Always the last event on success.
    Answer {
        /// Answer body.
        content: String,
        /// How the body should be interpreted.
        format: AnswerFormat,
    },
    /// Terminal failure. Always the last event when the query cannot finish.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl QueryEvent {
    /// Create a status event.
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    /// Create a terminal answer event.
    pub fn answer(content: impl Into<String>, format: AnswerFormat) -> Self {
        Self::Answer {
            content: content.into(),
            format,
        }
    }

    /// Create a terminal error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// True for the two terminal variants.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Answer { .. } | Self::Error { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
