//! API routes.

pub mod health;
pub mod search;
pub mod status;

pub use health::{HealthResponse, health, health_routes};
pub use search::{SearchParams, search_handler, NDJSON_CONTENT_TYPE};
pub use status::{StatusResponse, status_handler};
