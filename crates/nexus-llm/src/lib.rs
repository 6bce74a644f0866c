//! Model provider abstraction for Nexus.
//!
//! This crate provides the types and plumbing for talking to generative
//! model providers, with quota-driven fallback across an ordered model
//! chain.
//!
//! # Architecture
//!
//! The core abstraction is the [`GenerativeBackend`] trait. Callers never
//! use a backend directly; every call goes through the [`FallbackExecutor`],
//! which walks its model chain on quota exhaustion.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  FallbackExecutor                        │
//! │  - generate() over [m1, m2, m3]          │
//! │  - create_session() -> ChatSession       │
//! └──────────────────────────────────────────┘
//!                     │
//!           ┌─────────┴─────────┐
//!           ▼                   ▼
//!      ┌─────────┐         ┌─────────┐
//!      │ Gemini  │         │  Mock   │
//!      └─────────┘         └─────────┘
//! ```

pub mod backend;
pub mod error;
pub mod fallback;
pub mod gemini;
pub mod session;
pub mod types;

pub use backend::{GenerativeBackend, MockBackend, SharedBackend};
pub use error::{LlmError, Result};
pub use fallback::{FallbackExecutor, FallbackPolicy};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use session::ChatSession;
pub use types::{
    FunctionCall, FunctionResponse, ModelRequest, ModelResponse, Part, ToolDefinition, Turn,
    TurnRole,
};
