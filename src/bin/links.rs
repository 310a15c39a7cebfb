use clap::Parser;
use relink::{Config, Workspace};
use anyhow::Result;

#[derive(Parser, Debug)]
#[command(name = "links")]
#[command(about = "Print derived links, or the connections of one entity")]
struct Args {
    /// Show connections of this entity instead of all links
    #[arg(short, long)]
    entity: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let workspace = Workspace::open(Config::load()?)?;

    match args.entity {
        Some(entity) => print_connections(&workspace, &entity)?,
        None => print_links(&workspace)?,
    }

    Ok(())
}

fn print_links(workspace: &Workspace) -> Result<()> {
    let links = workspace.links()?;

    println!("\n=== Derived Links ===\n");
    if links.is_empty() {
        println!("No relation resolves to two named entities.");
        return Ok(());
    }

    println!("{:-<80}", "");
    println!("{:>5}  {:<25} {:<20} {:<25}", "Row", "Source", "Relation", "Target");
    println!("{:-<80}", "");
    for row_link in &links {
        println!(
            "{:>5}  {:<25} {:<20} {:<25}",
            row_link.row, row_link.link.source, row_link.link.value, row_link.link.target
        );
    }
    println!("{:-<80}", "");
    println!("{} links\n", links.len());

    Ok(())
}

fn print_connections(workspace: &Workspace, entity: &str) -> Result<()> {
    let report = workspace.connections(entity)?;

    println!("\n=== Connections of '{}' (id {}) ===\n", entity, report.pivot_id);
    println!("{:-<80}", "");
    println!("{:<20} {:<20} {:<20} {:<20}", "Relation", "Target", "Target description", "Source description");
    println!("{:-<80}", "");
    for row in &report.connections {
        println!(
            "{:<20} {:<20} {:<20} {:<20}",
            row.value, row.target, row.target_description, row.source_description
        );
    }
    println!("{:-<80}", "");
    println!(
        "{} connections exported to {}\n",
        report.connections.len(),
        workspace.connections_path().display()
    );

    Ok(())
}
