//! contrib-crawler main entry point
//!
//! This is the command-line interface for discovering extension
//! contributions on GitHub and inspecting the resulting database.

use clap::{Parser, Subcommand};
use contrib_crawler::config::{load_config_with_hash, validate, Config};
use contrib_crawler::crawler::run_crawl;
use contrib_crawler::output::{load_statistics, print_query_result, print_statistics};
use contrib_crawler::storage::{open_storage, ContributionStore};
use contrib_crawler::ContributionKind;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE: &str = "contributions.db";

/// contrib-crawler: discovers extension contributions on GitHub
///
/// Searches GitHub for activity, trigger and contribution descriptors,
/// fetches each one and records it in a SQLite database keyed on the
/// descriptor's ref.
#[derive(Parser, Debug)]
#[command(name = "contrib-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Discovers extension contributions on GitHub", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema
    Init {
        /// Path to the SQLite database
        #[arg(long, default_value = DEFAULT_DATABASE)]
        db: PathBuf,
    },

    /// Crawl GitHub for one kind of contribution
    Crawl {
        /// Kind to discover: activity, trigger or contribution
        #[arg(long = "type", value_name = "TYPE")]
        kind: ContributionKind,

        /// Stop once repositories are older than this many hours (0 = never)
        #[arg(long, value_name = "HOURS")]
        timeout: f64,

        /// Path to TOML configuration file
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Path to the SQLite database, overriding the configuration
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Run a read-only SQL query and print the rows tab-separated
    Query {
        /// Path to the SQLite database
        #[arg(long, default_value = DEFAULT_DATABASE)]
        db: PathBuf,

        /// The SQL statement
        #[arg(short, long = "query", value_name = "SQL")]
        q: String,
    },

    /// Show statistics from the database
    Stats {
        /// Path to the SQLite database
        #[arg(long, default_value = DEFAULT_DATABASE)]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Init { db } => handle_init(&db)?,
        Command::Crawl {
            kind,
            timeout,
            config,
            db,
        } => {
            let config = resolve_config(config.as_deref(), db.as_deref())?;
            handle_crawl(&config, kind, timeout).await?;
        }
        Command::Query { db, q } => handle_query(&db, &q)?,
        Command::Stats { db } => handle_stats(&db)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("contrib_crawler=info,warn"),
            1 => EnvFilter::new("contrib_crawler=debug,info"),
            2 => EnvFilter::new("contrib_crawler=trace,debug"),
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

/// Loads the configuration file if given, otherwise uses defaults
///
/// `--db` wins over the configured database path.
fn resolve_config(
    config_path: Option<&Path>,
    db: Option<&Path>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path).map_err(|e| {
                tracing::error!("Failed to load configuration: {}", e);
                e
            })?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default_for(DEFAULT_DATABASE),
    };

    if let Some(db) = db {
        config.output.database_path = db.to_string_lossy().into_owned();
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the init command: creates the schema
fn handle_init(db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(db)?;
    println!(
        "Database ready: {} ({} contributions)",
        db.display(),
        storage.count_contributions()?
    );
    Ok(())
}

/// Handles the crawl command, cancelling the run on Ctrl-C
async fn handle_crawl(
    config: &Config,
    kind: ContributionKind,
    timeout: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Database: {}", config.output.database_path);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping the crawl");
            on_interrupt.cancel();
        }
    });

    match run_crawl(config, kind, timeout, cancel).await {
        Ok(summary) => {
            println!("{}", summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the query command
fn handle_query(db: &Path, sql: &str) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(db)?;
    let result = storage.query(sql)?;
    print_query_result(&result);
    Ok(())
}

/// Handles the stats command
fn handle_stats(db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(db)?;

    println!("Database: {}\n", db.display());
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}
