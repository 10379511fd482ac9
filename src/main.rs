//! Quote Archiver main entry point
//!
//! This is the command-line interface for the incremental quote archiver.

use anyhow::Context;
use clap::Parser;
use quote_archiver::config::{load_config_with_hash, Config};
use quote_archiver::crawler::crawl;
use quote_archiver::output::print_summary;
use quote_archiver::state::CrawlState;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Quote Archiver: saves new quotes from the main and abyss-best feeds
///
/// Each run fetches only quotes newer than the ones saved by the previous
/// successful run, writes each as its own text file, and records the newest
/// ids in the state file.
#[derive(Parser, Debug)]
#[command(name = "quote-archiver")]
#[command(version)]
#[command(about = "Incrementally archives quotes from a paginated quote site", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore the stored cursors and walk both feeds from scratch
    #[arg(long)]
    fresh: bool,

    /// Show the effective configuration and stored cursors without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            println!("Unexpected error has occurred. {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => load(path)?,
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, cli.config.is_some()).await;
        return Ok(());
    }

    handle_crawl(config, cli.fresh).await
}

fn load(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("quote_archiver=info,warn"),
            1 => EnvFilter::new("quote_archiver=debug,info"),
            2 => EnvFilter::new("quote_archiver=trace,debug"),
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

/// Handles the --dry-run mode: shows configuration and stored cursors
async fn handle_dry_run(config: &Config, from_file: bool) {
    println!("=== Quote Archiver Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Write concurrency: {}", config.crawler.write_concurrency);
    println!("  Abyss-best lookback: {} months", config.crawler.lookback_months);
    println!("  Id ordering: {}", config.crawler.id_ordering);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s (connect {}s)", config.http.timeout_secs, config.http.connect_timeout_secs);
    println!("  Fallback charset: {}", config.http.charset);

    println!("\nFeeds:");
    println!(
        "  main: {} -> {}",
        config.feeds.main.base_url, config.feeds.main.output_dir
    );
    println!(
        "  abyss-best: {} -> {}",
        config.feeds.abyss_best.base_url, config.feeds.abyss_best.output_dir
    );

    let state = CrawlState::load_or_default(Path::new(&config.state.path)).await;
    println!("\nState ({}):", config.state.path);
    println!("  main cursor: {}", state.main);
    println!("  abyss-best cursor: {}", state.abyss_best);

    for dir in [&config.feeds.main.output_dir, &config.feeds.abyss_best.output_dir] {
        if !Path::new(dir).is_dir() {
            println!("\n! Output directory {} does not exist; create it before crawling", dir);
        }
    }

    println!("\n{}", config_verdict(from_file));
}

fn config_verdict(from_file: bool) -> &'static str {
    if from_file {
        "✓ Configuration is valid"
    } else {
        "✓ No configuration file given, using built-in defaults"
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    let summary = crawl(config, fresh)
        .await
        .context("crawl failed, state file left unchanged")?;

    tracing::info!(
        "Crawl completed: {} quotes saved in {:?}",
        summary.total_saved(),
        summary.elapsed
    );
    print_summary(&summary);

    Ok(())
}
