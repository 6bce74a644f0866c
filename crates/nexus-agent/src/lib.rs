//! Agent core for Nexus.
//!
//! This crate turns one user query into an ordered stream of events. The
//! pipeline is:
//!
//! ```text
//! query ──► gatekeeper ──► CHAT:   one model reply
//!                     └──► SEARCH: tool-calling loop
//!                                   ├─ search_local_entities
//!                                   └─ search_web
//! ```
//!
//! Every model call rides the fallback executor from `nexus-llm`; every
//! tool invocation is recorded on the stream as a status record followed
//! by a tool artifact. See [`Agent::run_query`].

pub mod agent;
pub mod error;
pub mod events;
pub mod gatekeeper;
pub mod tool;
pub mod tools;

pub use agent::{Agent, AgentBuilder, AgentConfig};
pub use error::{AgentError, Result};
pub use events::{AnswerFormat, ArtifactStatus, QueryEvent};
pub use gatekeeper::{Classification, Intent};
pub use tool::{
    ParamExt, ParamResult, ParameterValidationError, Tool, ToolContext, ToolRegistry, ToolResult,
};
pub use tools::{
    EntitySearchTool, SearchError, SearchResult, SerperClient, SerperConfig, WebSearchTool,
    NO_RECORDS_SENTINEL, WEB_ERROR_PREFIX,
};
