use clap::Parser;
use relink::{Config, Workspace};
use std::path::PathBuf;
use std::time::Instant;
use anyhow::{Context, Result};

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Extract an XML relationship export into the Relink table (replaces the current table)")]
struct Args {
    /// Document to extract (.xml or .txt)
    file: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!("Table mirror: {}", config.table_path().display());

    let workspace = Workspace::open(config)?;
    if workspace.has_table() {
        log::info!("Existing table will be replaced");
    }

    let start = Instant::now();
    let summary = workspace
        .upload_path(&args.file)
        .with_context(|| format!("Failed to ingest {}", args.file.display()))?;

    log::info!("=== Ingestion Complete ===");
    log::info!("File: {}", summary.filename);
    log::info!("Records extracted: {}", summary.records);
    log::info!("Links derivable: {}", workspace.links().map(|l| l.len()).unwrap_or(0));
    log::info!("Time: {:?}", start.elapsed());

    Ok(())
}
