//! Bio-Harvest main entry point
//!
//! This is the command-line interface for the Bio-Harvest biography crawler.

use anyhow::{Context, Result};
use bio_harvest::config::{load_config_with_hash, Config};
use bio_harvest::crawler::Coordinator;
use bio_harvest::output::{load_latest_run, print_report, print_run, MarkdownReport, StatsSink};
use bio_harvest::storage::{DocumentStore, MemoryStore, SqliteStorage};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Bio-Harvest: a budgeted biography crawler
///
/// Bio-Harvest walks an encyclopedia from a set of seed pages, keeps the
/// pages that describe people and stops when the target count or one of its
/// time, page or failure budgets is reached.
#[derive(Parser, Debug)]
#[command(name = "bio-harvest")]
#[command(version)]
#[command(about = "A budgeted biography crawler", long_about = None)]
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

    /// Validate config and show the crawl plan without crawling
    #[arg(long, conflicts_with_all = ["stats", "no_db"])]
    dry_run: bool,

    /// Show the most recent run from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "no_db"])]
    stats: bool,

    /// Crawl without writing to the database; only the markdown report is kept
    #[arg(long)]
    no_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, config_hash, cli.no_db).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bio_harvest=info,warn"),
            1 => EnvFilter::new("bio_harvest=debug,info"),
            2 => EnvFilter::new("bio_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;
    let fetch = &config.fetch;

    println!("=== Bio-Harvest Dry Run ===\n");

    println!("Budgets:");
    println!("  Target count: {}", crawler.target_count);
    println!("  Max pages visited: {}", crawler.max_pages_visited);
    println!("  Max wall clock: {}s", crawler.max_wall_clock_seconds);
    println!(
        "  Max consecutive failures: {}",
        crawler.max_consecutive_failures
    );
    match crawler.max_frontier_size {
        Some(max) => println!("  Max frontier size: {}", max),
        None => println!("  Max frontier size: unbounded"),
    }

    println!("\nWorkers: {}", crawler.worker_count);
    println!("Respect robots.txt: {}", crawler.respect_robots_txt);

    println!("\nFetch:");
    println!("  Request timeout: {}s", fetch.request_timeout_seconds);
    println!("  Attempts per URL: {}", fetch.retry_max_attempts);
    println!(
        "  Inter-request delay: {}..{}s",
        fetch.inter_request_delay.min, fetch.inter_request_delay.max
    );
    println!(
        "  Identities: {}",
        if config.identities.is_empty() {
            "built-in pool".to_string()
        } else {
            config.identities.len().to_string()
        }
    );

    println!(
        "\nClassifier affirming threshold: {}",
        config.classifier.affirming_threshold
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nSeeds ({}):", crawler.seeds.len());
    for seed in &crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows the most recent run
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("Failed to open database")?;

    match load_latest_run(&storage)? {
        Some(run) => print_run(&run),
        None => println!("No crawl runs recorded."),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String, no_db: bool) -> Result<()> {
    let markdown: Arc<dyn StatsSink> =
        Arc::new(MarkdownReport::new(&config.output.summary_path));

    let coordinator = if no_db {
        tracing::info!("Crawling without a database");
        Coordinator::new(config, Arc::new(MemoryStore::new()))
    } else {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))
            .context("Failed to open database")?;
        let run_id = storage.begin_run(&config_hash)?;
        tracing::info!("Starting run {}", run_id);

        let storage = Arc::new(storage);
        let store: Arc<dyn DocumentStore> = storage.clone();
        Coordinator::new(config, store).with_sink(storage)
    };
    let coordinator = coordinator
        .with_sink(markdown)
        .with_config_hash(config_hash);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            interrupt.cancel();
        }
    });

    let report = coordinator.run(cancel).await.context("Crawl failed")?;
    print_report(&report);

    Ok(())
}
