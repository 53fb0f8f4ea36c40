//! Crawler module for site discovery and page processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier (discovery queue and dedup sets)
//! - Per-page browsing contexts and the page pipeline
//! - HTML extraction and consent overlay dismissal
//! - Wave-based crawl coordination and progress reporting

mod consent;
mod context;
mod coordinator;
pub(crate) mod extract;
mod frontier;
mod pipeline;
mod progress;
mod types;

pub use consent::{ConsentDismisser, ConsentMatcher};
pub use context::ContextFactory;
pub use coordinator::Crawler;
pub use extract::{parse_document, ParsedDocument};
pub use frontier::Frontier;
pub use pipeline::PagePipeline;
pub use progress::{progress_channel, CrawlProgress, DEFAULT_PROGRESS_CAPACITY};
pub use types::{CrawlError, CrawlPageResult, CrawlResult, PageOutcome, QueueItem, SiteProfile};

use crate::browser::BrowserLauncher;
use crate::config::Config;
use std::sync::Arc;

/// Runs a complete crawl with the built-in detectors
///
/// This is the main entry point for crawling a site. It will:
/// 1. Launch the browser engine
/// 2. Seed the frontier with the start URL
/// 3. Process pages in bounded-concurrency waves
/// 4. Close the engine and return every page and error
///
/// # Arguments
///
/// * `config` - The crawl configuration
/// * `launcher` - Starts the browser engine
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Crawl completed, possibly with per-page errors
/// * `Err(LensError::EngineLaunch)` - The browser engine could not start
pub async fn crawl(
    config: Config,
    launcher: Arc<dyn BrowserLauncher>,
) -> crate::Result<CrawlResult> {
    Crawler::new(config, launcher).run().await
}
