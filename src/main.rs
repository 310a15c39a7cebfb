use relink::web::HttpServer;
use relink::{Config, Workspace};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("verify");

    match command {
        "serve" => run_http_server().await?,
        _ => run_verification()?,
    }

    Ok(())
}

/// Run the HTTP server over the configured workspace
async fn run_http_server() -> Result<()> {
    log::info!("Starting Relink HTTP Server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    let port = config.http_server.port;
    let workspace = Workspace::open(config)?;

    HttpServer::new(workspace).run(port).await?;

    Ok(())
}

/// Load configuration and the table mirror, then report what was found
fn run_verification() -> Result<()> {
    log::info!("Starting Relink v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!("Data directory: {}", config.data_dir().display());
    log::info!("Table mirror: {}", config.table_path().display());
    log::info!("Connection export: {}", config.connections_path().display());

    let workspace = Workspace::open(config)?;
    if !workspace.has_table() {
        log::info!("No table loaded yet. Upload a document or run `ingest <file>`.");
        return Ok(());
    }

    let table = workspace.table()?;
    let relations = table.relations().count();
    log::info!(
        "✓ Table loaded: {} records ({} relations, {} entities)",
        table.len(),
        relations,
        table.len() - relations
    );

    match workspace.links() {
        Ok(links) => log::info!("✓ {} links derivable", links.len()),
        Err(e) => log::warn!("Links not derivable: {}", e),
    }

    Ok(())
}
