use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use dbtscope_core::Config;
use dbtscope_store::ManifestStore;

/// dbtscope - query dbt manifest lineage and metadata from a local store
#[derive(Parser)]
#[command(name = "dbtscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: dbtscope.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite store (overrides config and DBT_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a manifest.json and replace the stored data with its contents
    Refresh {
        /// Path to manifest.json (falls back to config / DBT_MANIFEST_PATH)
        manifest: Option<PathBuf>,
    },

    /// List direct upstream dependencies of a node
    Upstream {
        /// Node unique_id (e.g. 'model.my_project.users')
        node_id: String,
    },

    /// List direct downstream dependents of a node
    Downstream {
        /// Node unique_id (e.g. 'model.my_project.users')
        node_id: String,
    },

    /// Show detailed information about a node
    Node {
        /// Node unique_id
        node_id: String,

        /// Emit JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Show detected schema version, capabilities and store statistics
    Schema {
        /// Emit JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    let db_path = cli.db.as_deref().unwrap_or(config.db_path.as_path());
    if cli.verbose {
        eprintln!("{} {}", "Using store:".cyan(), db_path.display());
    }

    let mut store = ManifestStore::open(db_path)?;

    match cli.command {
        Commands::Refresh { manifest } => {
            let path = manifest.or_else(|| config.manifest_path.clone());
            refresh_command(&mut store, path.as_deref(), cli.verbose)?;
        }
        Commands::Upstream { node_id } => {
            let upstream = store.upstream_of(&node_id)?;
            print_lineage(&node_id, &upstream, "upstream");
        }
        Commands::Downstream { node_id } => {
            let downstream = store.downstream_of(&node_id)?;
            print_lineage(&node_id, &downstream, "downstream");
        }
        Commands::Node { node_id, json } => {
            node_command(&store, &node_id, json)?;
        }
        Commands::Schema { json } => {
            schema_command(&store, json)?;
        }
    }

    store.close()?;
    Ok(())
}

/// Load config from --config, or dbtscope.toml if present, or defaults.
/// Environment variables override file values either way.
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("dbtscope.toml").exists() {
        Config::from_file(Path::new("dbtscope.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    Ok(config.with_env_overrides())
}

fn refresh_command(store: &mut ManifestStore, path: Option<&Path>, verbose: bool) -> Result<()> {
    if verbose {
        if let Some(path) = path {
            eprintln!("{} {}", "Loading manifest from:".cyan(), path.display());
        }
    }

    let summary = store.refresh(path)?;
    println!("{}", summary.to_string().green());
    Ok(())
}

fn print_lineage(node_id: &str, related: &[String], direction: &str) {
    println!("{} {}", "Node:".bold(), node_id.green());

    if related.is_empty() {
        println!("{}", format!("No {direction} dependencies").yellow());
        return;
    }

    println!("{} {}", format!("Direct {direction}:").bold(), related.len());
    for (i, id) in related.iter().enumerate() {
        println!("  {}. {}", i + 1, id.yellow());
    }
}

fn node_command(store: &ManifestStore, node_id: &str, json: bool) -> Result<()> {
    let detail = store.node_detail(node_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    println!("{} {}", "Node:".bold(), detail.unique_id.green());
    println!("  name:          {}", display(&detail.name));
    println!("  resource type: {}", display(&detail.resource_type));
    println!("  package:       {}", display(&detail.package_name));
    println!("  path:          {}", display(&detail.path));
    println!("  database:      {}", display(&detail.database));
    println!("  schema:        {}", display(&detail.schema));
    println!("  alias:         {}", display(&detail.alias));
    println!("  parents:       {}", detail.parent_count);
    println!("  children:      {}", detail.child_count);

    if let Some(compiled) = &detail.compiled_code {
        println!("\n{}", "Compiled code:".bold());
        println!("{compiled}");
    }

    Ok(())
}

fn schema_command(store: &ManifestStore, json: bool) -> Result<()> {
    let info = store.schema_info()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    match info.detected_version {
        Some(version) => {
            println!(
                "{} {}",
                "Detected schema version:".bold(),
                format!("v{version}").green()
            );
        }
        None => {
            println!("{}", "No manifest loaded yet - run 'dbtscope refresh'".yellow());
        }
    }

    if let Some(original) = &info.original_schema_version {
        println!("{} {}", "Declared version string:".bold(), original);
    }

    if let Some(caps) = &info.capabilities {
        println!("{} {}", "Node structure:".bold(), caps.node_structure);
        println!("{} {}", "Metadata location:".bold(), caps.metadata_location);
    }

    if !info.supported_features.is_empty() {
        println!("{}", "Supported features:".bold());
        for feature in &info.supported_features {
            println!("  - {feature}");
        }
    }

    println!("{}", "Store statistics:".bold());
    println!("  nodes:               {}", info.stats.nodes);
    println!("  sources:             {}", info.stats.sources);
    println!("  macros:              {}", info.stats.macros);
    println!("  parent relationships: {}", info.stats.parent_relationships);
    println!("  child relationships:  {}", info.stats.child_relationships);

    Ok(())
}

fn display(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("-")
}
