//! Serve command - runs the HTTP API server.

use std::net::SocketAddr;

use anyhow::Result;
use clap::Args;

use nexus_server::{AppState, KeyFlags, Server, ServerConfig};

use super::{Context, bootstrap};

/// Arguments for the serve command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let settings = bootstrap::load_settings(ctx)?;

    // ── Bind address ────────────────────────────────────────────────────

    let port = args.port.unwrap_or(settings.server.port);
    let bind = args
        .bind
        .clone()
        .unwrap_or_else(|| settings.server.bind.clone());
    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;

    if ctx.verbose {
        println!("Bind address: {}", addr);
    }

    // ── Credentials ─────────────────────────────────────────────────────

    let keys = KeyFlags {
        gemini: settings.llm.api_key.is_some(),
        serper: settings.search.api_key.is_some(),
    };

    if !keys.gemini {
        tracing::warn!("No Gemini API key configured");
        eprintln!("warning: no Gemini API key configured; queries will fail");
    }
    if !keys.serper {
        eprintln!("warning: no Serper API key configured; web search is disabled");
    }

    // ── Build agent and server ──────────────────────────────────────────

    let agent = bootstrap::build_agent(&settings, ctx.verbose)?;

    let server_config = ServerConfig::new()
        .with_bind_address(addr)
        .with_allowed_origins(settings.server.allowed_origins.clone());

    let state = AppState::new(agent, server_config).with_key_flags(keys);
    let server = Server::from_state(state);

    println!("Nexus server starting on http://{}", addr);
    println!("Press Ctrl+C to stop");

    server.run().await?;

    Ok(())
}
