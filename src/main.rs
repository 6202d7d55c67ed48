//! Seo-Sweep main entry point
//!
//! This is the command-line interface for the Seo-Sweep site auditor.

use anyhow::Context;
use clap::Parser;
use seo_sweep::config::{hash_content, load_config_with_hash, Config};
use seo_sweep::crawler::{run_report, CancellationToken, ChannelObserver, CrawlEvent, CrawlSummary};
use seo_sweep::output::{CsvSink, SqliteSink, TeeSink};
use seo_sweep::{seed_url, ReportKind};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Seo-Sweep: a same-site SEO crawler
///
/// Seo-Sweep visits every page reachable from a starting URL on the same host and
/// writes one report per run: missing meta descriptions, 404 pages, image alt text and
/// size, H1/H2 structure, page titles or security posture.
#[derive(Parser, Debug)]
#[command(name = "seo-sweep")]
#[command(version)]
#[command(about = "A same-site SEO crawler", long_about = None)]
struct Cli {
    /// Report to produce
    #[arg(value_enum, value_name = "REPORT")]
    report: ReportKind,

    /// Starting URL; `https://` is assumed when no scheme is given
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the CSV report (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Also store the report in this SQLite database (overrides the config file)
    #[arg(long, value_name = "DB")]
    sqlite: Option<PathBuf>,

    /// Validate config and seed URL and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = load_configuration(cli.config.as_deref())?;
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }
    if let Some(db) = &cli.sqlite {
        config.output.sqlite_path = Some(db.display().to_string());
    }

    let seed = seed_url(&cli.url).with_context(|| format!("Invalid starting URL '{}'", cli.url))?;

    if cli.dry_run {
        print_dry_run(&config, cli.report, &seed);
        return Ok(());
    }

    let summary = handle_crawl(config, config_hash, cli.report, seed).await?;
    print_summary(cli.report, &summary);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_sweep=info,warn"),
            1 => EnvFilter::new("seo_sweep=debug,info"),
            2 => EnvFilter::new("seo_sweep=trace,debug"),
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

/// Loads the config file when one is given, otherwise the built-in defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<(Config, String)> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok((config, hash))
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Ok((Config::default(), hash_content("")))
        }
    }
}

/// Shows the effective settings without crawling
fn print_dry_run(config: &Config, report: ReportKind, seed: &url::Url) {
    println!("=== Seo-Sweep Dry Run ===\n");

    println!("Report: {} ({})", report.label(), report.slug());
    println!("Seed URL: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout_secs);
    println!(
        "  Image probe timeout: {}s",
        config.crawler.image_probe_timeout_secs
    );
    println!("  Image size limit: {} KB", config.crawler.image_size_limit_kb);
    println!("  Max alt length: {}", config.crawler.max_alt_length);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Delimiter: {:?}", config.output.delimiter);
    match &config.output.sqlite_path {
        Some(path) => println!("  SQLite: {}", path),
        None => println!("  SQLite: (disabled)"),
    }

    println!("\n✓ Configuration is valid");
}

/// Runs the crawl on a background task, cancelling it on Ctrl-C
async fn handle_crawl(
    config: Config,
    config_hash: String,
    report: ReportKind,
    seed: url::Url,
) -> anyhow::Result<CrawlSummary> {
    let mut sink = TeeSink::new().with(
        CsvSink::new(&config.output.directory, config.output.delimiter)
            .context("Failed to prepare CSV report")?,
    );
    if let Some(path) = &config.output.sqlite_path {
        let sqlite = SqliteSink::open(Path::new(path))
            .with_context(|| format!("Failed to open report database {}", path))?
            .with_config_hash(config_hash);
        sink.push(Box::new(sqlite));
    }

    let cancel = CancellationToken::new();
    let (mut observer, mut events) = ChannelObserver::channel();

    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            run_report(config, report, &seed, &mut sink, &cancel, &mut observer).await
        })
    };

    let mut interrupted = false;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(CrawlEvent::Progress(sample)) => {
                    tracing::debug!("Progress: {} ({:.0}%)", sample, sample.ratio() * 100.0);
                }
                Some(CrawlEvent::Complete(status)) => {
                    tracing::debug!("Crawl finished: {}", status);
                    break;
                }
                None => break,
            },
            result = tokio::signal::ctrl_c(), if !interrupted => {
                if let Err(e) = result {
                    tracing::warn!("Could not listen for Ctrl-C: {}", e);
                } else {
                    tracing::warn!("Interrupt received, stopping after the current page");
                    cancel.cancel();
                }
                interrupted = true;
            }
        }
    }

    let summary = task.await.context("Crawl task panicked")??;
    Ok(summary)
}

fn print_summary(report: ReportKind, summary: &CrawlSummary) {
    println!("\n=== {} report {} ===", report.label(), summary.status);
    println!("  Pages visited: {}", summary.pages_visited);
    println!("  Pages discovered: {}", summary.pages_discovered);
    println!("  Fetch failures: {}", summary.fetch_failures);
    println!("  Rows written: {}", summary.rows_written);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
}
