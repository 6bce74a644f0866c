//! Seed command - creates and populates the entity database.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;

use nexus_store::EntityStore;

use super::{Context, bootstrap};

/// Arguments for the seed command.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Database path (overrides config)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

/// Seed result for JSON output.
#[derive(Debug, Serialize)]
struct SeedOutput {
    path: String,
    inserted: usize,
    total: i64,
}

/// Run the seed command.
pub async fn run(args: SeedArgs, ctx: &Context) -> Result<()> {
    let settings = bootstrap::load_settings(ctx)?;
    let path = args.db.unwrap_or(settings.store.path);

    let store = EntityStore::open(&path)?;
    let inserted = store.seed()?;
    let total = store.count()?;

    if ctx.json_output {
        let output = SeedOutput {
            path: path.display().to_string(),
            inserted,
            total,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if inserted > 0 {
        println!(
            "Seeded {} with {} records",
            style(path.display()).bold(),
            inserted
        );
    } else {
        println!(
            "Entity store {} already populated ({} records)",
            style(path.display()).bold(),
            total
        );
    }

    Ok(())
}
