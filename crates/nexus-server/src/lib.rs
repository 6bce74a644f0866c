//! HTTP API server for Nexus.
//!
//! This crate provides the network transport layer for the Nexus agent:
//! a small REST surface plus the streaming search endpoint consumed by
//! the web client.
//!
//! # Endpoints
//!
//! - `GET /health` for liveness probes
//! - `GET /api/status` reports which provider keys are configured
//! - `GET /api/search?q=...` streams query progress as NDJSON
//!
//! # Example
//!
//! ```ignore
//! use nexus_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::new()
//!     .with_bind_address("127.0.0.1:8000".parse()?);
//!
//! let server = Server::new(agent, config);
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use routes::{NDJSON_CONTENT_TYPE, SearchParams, StatusResponse};
pub use state::{AppState, KeyFlags};

use std::net::SocketAddr;

use axum::Router;
use axum::http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use nexus_agent::Agent;

/// The Nexus HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server with the given agent and configuration.
    pub fn new(agent: Agent, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(agent, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            // Health route stays at the root so probes skip the API prefix
            .merge(routes::health_routes())
            .nest("/api", self.api_routes())
            .layer(self.cors_layer())
            // TraceLayer for detailed HTTP tracing
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// API routes.
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::get;

        Router::new()
            .route("/status", get(routes::status_handler))
            // The web client calls the search route with a trailing slash;
            // accept both spellings.
            .route("/search", get(routes::search_handler))
            .route("/search/", get(routes::search_handler))
    }

    /// CORS layer allowing the configured frontend origins.
    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .state
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET])
            .allow_headers(Any)
    }

    /// Run the server on the configured bind address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
