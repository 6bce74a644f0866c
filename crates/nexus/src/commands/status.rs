//! Status command - shows resolved configuration and credentials.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use nexus_store::EntityStore;

use super::{Context, bootstrap};

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show the full model fallback chain
    #[arg(short, long)]
    pub detailed: bool,
}

/// Status report for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    gemini_api_key_loaded: bool,
    serper_api_key_loaded: bool,
    models: Vec<String>,
    store_path: String,
    entities: Option<i64>,
    server_address: String,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let settings = bootstrap::load_settings(ctx)?;

    // Entity count, when the database already exists
    let entities = if settings.store.path.is_file() {
        EntityStore::open(&settings.store.path)
            .and_then(|s| s.count())
            .ok()
    } else {
        None
    };

    if ctx.json_output {
        let output = StatusOutput {
            gemini_api_key_loaded: settings.llm.api_key.is_some(),
            serper_api_key_loaded: settings.search.api_key.is_some(),
            models: settings.llm.models.clone(),
            store_path: settings.store.path.display().to_string(),
            entities,
            server_address: settings.server.address(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let green = Style::new().green();
    let red = Style::new().red();

    let key_line = |present: bool| {
        if present {
            green.apply_to("● configured").to_string()
        } else {
            red.apply_to("● missing").to_string()
        }
    };

    println!();
    println!("{}", style("Nexus Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!(
        "  {} {}",
        dim.apply_to("Gemini key:"),
        key_line(settings.llm.api_key.is_some())
    );
    println!(
        "  {} {}",
        dim.apply_to("Serper key:"),
        key_line(settings.search.api_key.is_some())
    );

    if args.detailed {
        println!(
            "  {} {}",
            dim.apply_to("Models:"),
            settings.llm.models.join(", ")
        );
    } else {
        println!("  {} {}", dim.apply_to("Model:"), settings.llm.models[0]);
    }

    println!(
        "  {} {}",
        dim.apply_to("Store:"),
        settings.store.path.display()
    );
    if let Some(count) = entities {
        println!("  {} {}", dim.apply_to("Entities:"), count);
    }
    println!("  {} {}", dim.apply_to("Server:"), settings.server.address());
    println!();

    Ok(())
}
