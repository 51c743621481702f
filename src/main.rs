//! cc-harvest main entry point
//!
//! This is the command-line interface for the Crystalline Conflict
//! leaderboard harvester.

use cc_harvest::config::{load_config_with_hash, Config, OutputFormat};
use cc_harvest::output::print_statistics;
use cc_harvest::Coordinator;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// cc-harvest: Crystalline Conflict leaderboard harvester
///
/// Walks the ranked-match leaderboard of every configured group, looks up
/// the job of each ranked player on their profile, and archives the result.
#[derive(Parser, Debug)]
#[command(name = "cc-harvest")]
#[command(version)]
#[command(about = "Crystalline Conflict leaderboard harvester", long_about = None)]
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

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config, &config_hash, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cc_harvest=info,warn"),
            1 => EnvFilter::new("cc_harvest=debug,info"),
            2 => EnvFilter::new("cc_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the plan without fetching anything
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;
    println!("=== cc-harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", crawler.base_url);
    println!("  Max pages per group: {}", crawler.max_pages);
    println!("  Full page size: {}", crawler.page_size);
    println!("  Detail workers: {}", crawler.workers);
    println!(
        "  Retries: {} attempts, backoff {}ms..{}ms",
        crawler.max_attempts, crawler.backoff_base_ms, crawler.max_backoff_ms
    );
    println!("  Duplicate ids: {:?}", crawler.duplicate_policy);

    println!("\nRate Limits:");
    println!(
        "  Listing: {} calls / {}ms",
        config.rate_limit.listing.calls, config.rate_limit.listing.period_ms
    );
    println!(
        "  Detail: {} calls / {}ms",
        config.rate_limit.detail.calls, config.rate_limit.detail.period_ms
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    match config.output.format {
        OutputFormat::Csv => println!("  CSV archive in {}", config.output.archive_dir),
        OutputFormat::Sqlite => println!("  SQLite database {}", config.output.database_path),
    }

    println!("\nGroups ({}):", crawler.groups.len());
    for group in &crawler.groups {
        println!("  - {}", group);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would request at most {} listing pages",
        crawler.max_pages as usize * crawler.groups.len()
    );
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: Config,
    config_hash: &str,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Harvesting groups: {}", config.crawler.groups.join(", "));

    let mut coordinator = Coordinator::new(config, config_hash)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight requests");
            on_interrupt.cancel();
        }
    });

    match coordinator.run(&cancel).await {
        Ok(report) => {
            if let Some(receipt) = &report.receipt {
                tracing::info!("Archived {} entrants to {}", receipt.rows, receipt.location);
            }
            if !quiet {
                print_statistics(&report.statistics);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
