//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest package catalog harvester.

use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::harvester::harvest;
use catalog_harvest::storage::{SqliteStorage, Storage, StorageError};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a resumable package catalog harvester
///
/// Catalog-Harvest reads a package index, fetches every detail page through
/// rotating proxies and user agents, and stores normalized package records
/// and their dependencies in SQLite. Interrupted runs resume where they stopped.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable package catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Process at most N index entries (overrides the config)
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "show"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "show"])]
    stats: bool,

    /// Print one stored entry and exit
    #[arg(long, value_name = "NAME", conflicts_with_all = ["dry_run", "stats"])]
    show: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(limit) = cli.limit {
        config.harvest.limit = limit;
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(name) = &cli.show {
        handle_show(&config, name)?;
    } else {
        handle_harvest(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Catalog:");
    println!("  Index: {}", config.catalog.index_url);
    println!("  Detail pages: {}", config.catalog.detail_url);

    println!("\nIdentity:");
    println!("  Proxy source: {}", config.identity.proxy_source);
    println!("  User-agent source: {}", config.identity.user_agent_source);
    println!("  User-agent selector: {}", config.identity.user_agent_selector);
    println!("  Max proxy uses: {}", config.identity.max_proxy_uses);
    println!("  Max user agents: {}", config.identity.max_user_agents);

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Rotate after: {} failures", config.fetch.rotate_after);
    if config.fetch.max_attempts == 0 {
        println!("  Max attempts: unbounded");
    } else {
        println!("  Max attempts: {}", config.fetch.max_attempts);
    }
    println!("  Retry delay: {}ms", config.fetch.retry_delay_ms);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
    if config.harvest.limit == 0 {
        println!("✓ Would harvest every entry listed on the index");
    } else {
        println!(
            "✓ Would harvest at most {} entries from the index",
            config.harvest.limit
        );
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    println!("Entries:      {}", storage.count_entries()?);
    println!("Dependencies: {}", storage.count_dependencies()?);
    println!("Links:        {}", storage.count_links()?);

    match storage.get_latest_run()? {
        Some(run) => {
            println!("\nLatest run: #{}", run.id);
            println!("  Status:  {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Entries stored: {}", run.entries_stored);
        }
        None => println!("\nNo runs recorded"),
    }

    Ok(())
}

/// Handles the --show mode: prints one stored entry
fn handle_show(config: &Config, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    match storage.load(name) {
        Ok(entry) => {
            print!("{}", entry);
            Ok(())
        }
        Err(StorageError::NotFound(_)) => {
            println!("No entry named '{}' is stored", name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: Config,
    config_hash: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Harvesting {}", config.catalog.index_url);
    if config.harvest.limit > 0 {
        tracing::info!("Entry limit: {}", config.harvest.limit);
    }

    match harvest(config, config_hash).await {
        Ok(summary) => {
            tracing::info!("Harvest completed successfully");
            println!("{}", summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
