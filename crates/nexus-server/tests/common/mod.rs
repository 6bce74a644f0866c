//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use nexus_agent::Agent;
use nexus_llm::{FallbackPolicy, MockBackend, ModelResponse};
use nexus_server::{AppState, KeyFlags, Server, ServerConfig};
use nexus_store::EntityStore;

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a test server that answers every query with a plain chat reply.
    pub async fn start() -> Result<Self> {
        Self::start_with_script(vec![
            Ok(ModelResponse::text_reply("mock-model", "CHAT")),
            Ok(ModelResponse::text_reply(
                "mock-model",
                "Hello! How can I help you today?",
            )),
        ])
        .await
    }

    /// Start a test server whose model backend replays the given outcomes.
    pub async fn start_with_script(script: Vec<nexus_llm::Result<ModelResponse>>) -> Result<Self> {
        // Find an available port
        let addr = find_available_port().await?;

        let backend = Arc::new(MockBackend::scripted(script));

        // Seeded in-memory store, shared with the agent
        let store = Arc::new(EntityStore::open_in_memory()?);
        store.seed()?;

        let agent = Agent::builder()
            .with_backend(backend)
            .with_policy(FallbackPolicy::new(vec![
                "model-a".to_string(),
                "model-b".to_string(),
            ])?)
            .with_store(store)
            .build()?;

        let config = ServerConfig::new().with_bind_address(addr);
        let state = AppState::new(agent, config).with_key_flags(KeyFlags {
            gemini: true,
            serper: false,
        });

        // Start server in background
        let server = Server::from_state(state);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        // Wait for server to be ready
        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Run a search query and collect the streamed NDJSON events.
    pub async fn search(&self, query: &str) -> Result<Vec<serde_json::Value>> {
        let resp = self
            .client
            .get(format!("{}/api/search", self.base_url()))
            .query(&[("q", query)])
            .send()
            .await?;

        anyhow::ensure!(
            resp.status().is_success(),
            "search returned {}",
            resp.status()
        );

        let body = resp.text().await?;
        let events = body
            .lines()
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    /// Check if server is healthy.
    pub async fn health(&self) -> Result<bool> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url()))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
