//! odds-crawler main entry point
//!
//! This is the command-line interface for the esports odds crawler.

use anyhow::Context;
use clap::Parser;
use odds_crawler::config::{load_config_with_hash, validate, Config};
use odds_crawler::crawler::crawl;
use odds_crawler::output::{load_statistics, print_report, print_statistics};
use odds_crawler::storage::open_storage;
use odds_crawler::Site;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// odds-crawler: esports betting-odds collector
///
/// Reads a bookmaker's esports listing page, visits every match it links to
/// in small concurrent batches, and stores teams, kickoff times and all
/// betting markets in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "odds-crawler")]
#[command(version)]
#[command(about = "Esports betting-odds crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Bookmaker to crawl, overriding the config file
    #[arg(long, value_enum)]
    site: Option<Site>,

    /// Listing page URL, overriding the config file
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if apply_overrides(&mut config, &cli) {
        validate(&config).context("Invalid command-line override")?;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(&config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("odds_crawler=info,warn"),
            1 => EnvFilter::new("odds_crawler=debug,info"),
            2 => EnvFilter::new("odds_crawler=trace,debug"),
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

/// Applies `--site` and `--url`; returns whether anything changed
fn apply_overrides(config: &mut Config, cli: &Cli) -> bool {
    let mut changed = false;

    if let Some(site) = cli.site {
        if site != config.crawler.site {
            // A listing or origin configured for another site no longer applies
            config.crawler.listing_url = None;
            config.crawler.base_url = None;
        }
        config.crawler.site = site;
        changed = true;
    }
    if let Some(url) = &cli.url {
        config.crawler.listing_url = Some(url.clone());
        changed = true;
    }

    changed
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== odds-crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Site: {}", config.crawler.site);
    println!("  Listing: {}", config.crawler.listing_url()?);
    println!("  Base URL: {}", config.crawler.base_url()?);
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Render timeout: {}s", config.crawler.render_timeout_secs);

    println!("\nRenderer:");
    println!("  User agent: {}", config.renderer.user_agent);
    println!("  Request timeout: {}s", config.renderer.request_timeout_secs);
    println!("  Connect timeout: {}s", config.renderer.connect_timeout_secs);
    println!("  Poll interval: {}ms", config.renderer.poll_interval_ms);

    println!("\nDatabase:");
    println!("  Path: {}", config.database.path);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.database.path);

    let storage = open_storage(Path::new(&config.database.path))
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} in batches of {}",
        config.crawler.site,
        config.crawler.batch_size
    );

    match crawl(config, config_hash).await {
        Ok(report) => {
            print_report(&report);
            if report.is_complete() {
                tracing::info!("Crawl completed successfully");
            } else {
                tracing::warn!(
                    "Crawl completed with {} failed matches",
                    report.failures.len()
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
