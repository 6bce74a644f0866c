//! Built-in tools available to the conversation loop.

pub mod entities;
pub mod web;

pub use entities::{EntitySearchTool, NO_RECORDS_SENTINEL};
pub use web::{
    SearchError, SearchResult, SerperClient, SerperConfig, WebSearchTool, WEB_ERROR_PREFIX,
};
