//! Articlesa main entry point
//!
//! This is the command-line interface for the Articlesa source tree builder.

use anyhow::{bail, Context};
use articlesa::config::{build_blacklist, load_config_with_hash, Config, MAX_ALLOWED_DEPTH};
use articlesa::crawler::{build_orchestrator, CrawlRequest};
use articlesa::store::{open_store, ArticleStore};
use articlesa::stream::StreamFormat;
use articlesa::url::CanonicalUrl;
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Articlesa: an article source tree builder
///
/// Articlesa follows the links an article cites, and the links those
/// articles cite, up to a bounded depth. Progress is written to stdout as a
/// stream of events while the crawl runs.
#[derive(Parser, Debug)]
#[command(name = "articlesa")]
#[command(version)]
#[command(about = "Builds the graph of articles an article cites", long_about = None)]
struct Cli {
    /// Seed article URL
    #[arg(value_name = "URL", required_unless_present = "stats")]
    url: Option<String>,

    /// Maximum crawl depth (overrides the configuration)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=MAX_ALLOWED_DEPTH as i64))]
    depth: Option<u32>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host blacklist file, one host per line (overrides the configuration)
    #[arg(short, long, value_name = "FILE")]
    blacklist: Option<PathBuf>,

    /// Event framing written to stdout
    #[arg(short, long, value_enum, default_value_t = Format::Sse)]
    format: Format,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the article store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Server-sent events
    Sse,
    /// One JSON object per line
    Json,
}

impl From<Format> for StreamFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Sse => StreamFormat::Sse,
            Format::Json => StreamFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_dir) = load(&cli)?;

    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(file) = &cli.blacklist {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        config.blacklist.file = Some(cwd.join(file).display().to_string());
    }

    if cli.stats {
        return handle_stats(&config, config_dir.as_deref());
    }

    let Some(url) = cli.url.as_deref() else {
        bail!("a seed URL is required");
    };

    if cli.dry_run {
        handle_dry_run(&config, config_dir.as_deref(), url)
    } else {
        handle_crawl(&config, config_dir.as_deref(), url, cli.format.into()).await
    }
}

/// Loads the configuration file, or the defaults when none is given
fn load(cli: &Cli) -> anyhow::Result<(Config, Option<PathBuf>)> {
    let Some(path) = &cli.config else {
        tracing::debug!("No configuration file given; using defaults");
        return Ok((Config::default(), None));
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let dir = path.parent().map(Path::to_path_buf);
    Ok((config, dir))
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries only the event stream.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("articlesa=info,warn"),
            1 => EnvFilter::new("articlesa=debug,info"),
            2 => EnvFilter::new("articlesa=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, config_dir: Option<&Path>, url: &str) -> anyhow::Result<()> {
    let seed = CanonicalUrl::parse(url).with_context(|| format!("Invalid seed URL {}", url))?;
    let blacklist = build_blacklist(config, config_dir).context("Failed to build blacklist")?;

    println!("=== Articlesa Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Fetch timeout: {}ms", config.crawler.fetch_timeout_ms);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!(
        "  Max redirect probes: {}",
        config.crawler.max_redirect_probes
    );
    println!("  Max redirects: {}", config.crawler.max_redirects);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nStore:");
    match &config.store.database_path {
        Some(path) => println!("  Database: {}", path),
        None => println!("  (none)"),
    }

    println!("\nBlacklisted Hosts: {}", blacklist.len());

    println!("\nSeed:");
    println!("  URL: {}", seed.url);
    println!("  Hash: {}", seed.hash);

    if blacklist.is_url_blocked(&seed.url) {
        bail!("seed host of {} is blacklisted", seed.url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows counts from the article store
fn handle_stats(config: &Config, config_dir: Option<&Path>) -> anyhow::Result<()> {
    let Some(database_path) = &config.store.database_path else {
        bail!("no article store configured (set store.database-path)");
    };
    let path = match config_dir {
        Some(dir) => dir.join(database_path),
        None => PathBuf::from(database_path),
    };

    println!("Database: {}\n", path.display());

    let store = open_store(&path)
        .with_context(|| format!("Failed to open article store {}", path.display()))?;
    let stats = store.stats().context("Failed to read store statistics")?;

    println!("Articles:  {}", stats.articles);
    println!("Citations: {}", stats.citations);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_dir: Option<&Path>,
    url: &str,
    format: StreamFormat,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config, config_dir)?;
    let request = CrawlRequest::new(url, config.crawler.max_depth);

    let mut session = orchestrator
        .start(request)
        .with_context(|| format!("Cannot crawl {}", url))?;

    let mut stdout = std::io::stdout();
    while let Some(event) = session.events.recv().await {
        let written = stdout
            .write_all(format.frame(&event).as_bytes())
            .and_then(|_| stdout.flush());
        if let Err(e) = written {
            tracing::warn!("Stopping crawl: cannot write to stdout: {}", e);
            break;
        }
    }

    // Dropping the receiver tells the crawl to stop if it is still running
    drop(session.events);
    let outcome = session.handle.await.context("Crawl task failed")?;

    if outcome.cancelled {
        tracing::info!("Crawl stopped before completion");
    }

    Ok(())
}
