//! Sumi-Lens main entry point
//!
//! This is the command-line interface for the Sumi-Lens site crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_lens::browser::HttpLauncher;
use sumi_lens::config::{load_config_with_hash, validate, Config};
use sumi_lens::crawler::{progress_channel, CrawlProgress, Crawler, DEFAULT_PROGRESS_CAPACITY};
use sumi_lens::output::{write_outputs, RunInfo};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Sumi-Lens: a bounded, concurrent site crawler
///
/// Sumi-Lens visits the pages of one website within depth, page and
/// concurrency bounds, classifies each page, profiles the site from its entry
/// page and captures screenshots where the browser engine supports them.
#[derive(Parser, Debug)]
#[command(name = "sumi-lens")]
#[command(version = "1.0.0")]
#[command(about = "A bounded, concurrent site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Override the start URL
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Override the page budget
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Override the depth bound
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.crawl.start_url = url.clone();
        }
        if let Some(max_pages) = self.max_pages {
            config.crawl.max_pages = max_pages;
        }
        if let Some(max_depth) = self.max_depth {
            config.crawl.max_depth = max_depth;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, then re-validate after overrides
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_lens=info,warn"),
            1 => EnvFilter::new("sumi_lens=debug,info"),
            2 => EnvFilter::new("sumi_lens=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    let crawl = &config.crawl;

    println!("=== Sumi-Lens Dry Run ===\n");

    println!("Crawl:");
    println!("  Start URL: {}", crawl.start_url);
    println!("  Max depth: {}", crawl.max_depth);
    println!("  Max pages: {}", crawl.max_pages);
    println!("  Concurrency: {}", crawl.concurrency);
    println!("  Delay between waves: {}ms", crawl.delay_between_requests);
    println!("  Skip resources: {}", crawl.skip_resources);
    println!("  Skip screenshots: {}", crawl.skip_screenshots);
    if !crawl.include_paths.is_empty() {
        println!("  Include paths: {}", crawl.include_paths.join(", "));
    }
    if !crawl.exclude_paths.is_empty() {
        println!("  Exclude paths: {}", crawl.exclude_paths.join(", "));
    }

    println!("\nBrowser:");
    println!("  User agent: {}", config.browser.user_agent);
    println!("  Locale: {}", config.browser.locale);
    println!(
        "  Navigation timeout: {}ms",
        config.browser.navigation_timeout
    );
    println!(
        "  Viewport: {}x{}",
        config.browser.viewport_width, config.browser.viewport_height
    );

    println!("\nScreenshots:");
    if crawl.skip_screenshots {
        println!("  Disabled");
    } else if crawl.use_local_screenshots || config.storage.blob_endpoint.is_none() {
        println!("  Local: {}", config.storage.screenshot_dir);
    } else {
        println!(
            "  Remote: {} (credential from ${}), local fallback: {}",
            config.storage.blob_endpoint.as_deref().unwrap_or_default(),
            config.storage.blob_token_env,
            config.storage.screenshot_dir
        );
    }

    println!("\nOutput:");
    println!("  Result: {}", config.output.result_path);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
}

/// Logs progress reports until the crawler drops its sender
async fn drain_progress(mut receiver: mpsc::Receiver<CrawlProgress>) {
    while let Some(progress) = receiver.recv().await {
        tracing::info!(
            "[{}/{}] {} ({}, depth {})",
            progress.crawled,
            progress.discovered,
            progress.page.normalized_url,
            progress.page.category.as_str(),
            progress.page.depth
        );
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let (sender, receiver) = progress_channel(DEFAULT_PROGRESS_CAPACITY);
    let drain = tokio::spawn(drain_progress(receiver));

    let output = config.output.clone();
    let start_url = config.crawl.start_url.clone();

    let crawler = Crawler::new(config, Arc::new(HttpLauncher)).with_progress(sender);
    let crawl_id = crawler.crawl_id().to_string();

    let started_at = Utc::now();
    let result = crawler.run().await.context("Crawl failed")?;
    let finished_at = Utc::now();

    drain.await.context("Progress task failed")?;

    let run = RunInfo {
        crawl_id,
        start_url,
        config_hash,
        started_at,
        finished_at,
    };
    let summary = write_outputs(&output, &result, run).context("Failed to write crawl output")?;

    tracing::info!("Result written to {}", output.result_path);
    if let Some(path) = &output.summary_path {
        tracing::info!("Summary written to {}", path);
    }
    tracing::info!(
        "Crawled {} pages with {} errors in {}s",
        summary.total_pages,
        summary.total_errors,
        summary.duration_seconds
    );

    Ok(())
}
