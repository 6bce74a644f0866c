//! Service status endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Status response, including which provider credentials are configured.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: String,
    /// Whether a model provider API key is configured.
    pub gemini_api_key_loaded: bool,
    /// Whether a web search API key is configured.
    pub serper_api_key_loaded: bool,
}

/// GET /api/status - readiness and credential summary.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        gemini_api_key_loaded: state.keys.gemini,
        serper_api_key_loaded: state.keys.serper,
    })
}
