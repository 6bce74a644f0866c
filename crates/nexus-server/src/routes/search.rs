//! The streaming search endpoint.
//!
//! `GET /api/search?q=...` runs one query through the agent and streams its
//! events as NDJSON: one JSON object per line, written as soon as the agent
//! produces it. The HTTP status is always 200 once streaming starts; query
//! failures arrive in-band as a terminal error event.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::Response,
};
use futures::StreamExt;
use serde::Deserialize;

use crate::error::ServerError;
use crate::state::AppState;

/// NDJSON content type.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Query string for the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// The user's query.
    #[serde(default)]
    pub q: Option<String>,
}

/// GET /api/search - stream one query's events as NDJSON.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ServerError> {
    let query = params.q.as_deref().unwrap_or("").trim().to_string();
    if query.is_empty() {
        return Err(ServerError::BadRequest(
            "missing query parameter 'q'".to_string(),
        ));
    }

    tracing::info!(query = %query, "Search request accepted");

    let lines = state.agent.run_query(query).map(|event| {
        let line = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize query event");
                r#"{"type":"error","message":"event serialization failed"}"#.to_string()
            }
        };
        Ok::<_, Infallible>(format!("{line}\n"))
    });

    Response::builder()
        .header(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .body(Body::from_stream(lines))
        .map_err(|e| ServerError::Internal(format!("Failed to build response: {e}")))
}
