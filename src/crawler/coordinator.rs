//! Crawl loop
//!
//! Drives the frontier through bounded-concurrency waves:
//!
//! 1. `batch = min(concurrency, pages remaining, queue length)`; stop when
//!    the queue is empty or the page budget is spent
//! 2. Pop the batch, discarding duplicates, too-deep and filtered items;
//!    survivors are marked visited before any work starts
//! 3. Run the batch's page pipelines in parallel
//! 4. Barrier: integrate results in dispatch order (pages, errors, newly
//!    discovered links at `depth + 1`, progress reports)
//! 5. Sleep the politeness delay and repeat
//!
//! The frontier is only touched between waves, by this task alone.

use crate::artifact::{LocalScreenshots, ScreenshotStore};
use crate::browser::{BrowserEngine, BrowserLauncher};
use crate::config::Config;
use crate::crawler::consent::ConsentDismisser;
use crate::crawler::context::ContextFactory;
use crate::crawler::frontier::Frontier;
use crate::crawler::pipeline::PagePipeline;
use crate::crawler::progress::{CrawlProgress, ProgressReporter};
use crate::crawler::types::{CrawlError, CrawlResult, PageOutcome, QueueItem};
use crate::detect::Detectors;
use crate::url::{normalize_url, should_crawl};
use crate::LensError;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// Crawls one site and returns every page it could produce
///
/// # Example
///
/// ```no_run
/// use sumi_lens::browser::HttpLauncher;
/// use sumi_lens::{Config, Crawler};
/// use std::sync::Arc;
///
/// # async fn example() -> sumi_lens::Result<()> {
/// let config = Config::for_url("https://example.com/");
/// let result = Crawler::new(config, Arc::new(HttpLauncher)).run().await?;
/// println!("{} pages, {} errors", result.pages.len(), result.errors.len());
/// # Ok(())
/// # }
/// ```
pub struct Crawler {
    config: Arc<Config>,
    launcher: Arc<dyn BrowserLauncher>,
    detectors: Detectors,
    consent: ConsentDismisser,
    screenshots: Option<ScreenshotStore>,
    progress: Option<mpsc::Sender<CrawlProgress>>,
    crawl_id: String,
}

impl Crawler {
    /// Creates a crawler with the built-in detectors and consent matchers
    pub fn new(config: Config, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            config: Arc::new(config),
            launcher,
            detectors: Detectors::builtin(),
            consent: ConsentDismisser::default(),
            screenshots: None,
            progress: None,
            crawl_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_detectors(mut self, detectors: Detectors) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn with_consent(mut self, consent: ConsentDismisser) -> Self {
        self.consent = consent;
        self
    }

    /// Replaces the screenshot chain otherwise built from `[storage]`
    pub fn with_screenshot_store(mut self, store: ScreenshotStore) -> Self {
        self.screenshots = Some(store);
        self
    }

    /// Publishes a progress report per crawled page on `sender`
    pub fn with_progress(mut self, sender: mpsc::Sender<CrawlProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Identifier of this crawl; screenshots are stored under it
    pub fn crawl_id(&self) -> &str {
        &self.crawl_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the crawl to completion
    ///
    /// Per-page failures are reported in [`CrawlResult::errors`]. The only
    /// error returned is [`LensError::EngineLaunch`] (plus an unparseable
    /// start URL, which validation rejects earlier). The engine is closed on
    /// every path once launched.
    pub async fn run(self) -> crate::Result<CrawlResult> {
        let start_url = Url::parse(&self.config.crawl.start_url)?;
        let seed = normalize_url(&start_url, self.config.crawl.start_url.as_str())?;

        tracing::info!(
            "Starting crawl {} of {} (max depth {}, max pages {}, concurrency {})",
            self.crawl_id,
            seed,
            self.config.crawl.max_depth,
            self.config.crawl.max_pages,
            self.config.crawl.concurrency
        );

        let screenshots = self.screenshot_store();

        let engine = self
            .launcher
            .launch()
            .await
            .map_err(LensError::EngineLaunch)?;

        let started = Instant::now();
        let result = self.crawl(engine.clone(), seed, screenshots).await;

        if let Err(e) = engine.close().await {
            tracing::warn!("Failed to close browser engine: {}", e);
        }

        tracing::info!(
            "Crawl {} finished in {:?}: {} pages, {} errors",
            self.crawl_id,
            started.elapsed(),
            result.pages.len(),
            result.errors.len()
        );

        Ok(result)
    }

    /// Resolves the screenshot chain; `None` when screenshots are disabled
    fn screenshot_store(&self) -> Option<ScreenshotStore> {
        if self.config.crawl.skip_screenshots {
            return None;
        }
        if let Some(store) = &self.screenshots {
            return Some(store.clone());
        }

        let storage = &self.config.storage;
        match ScreenshotStore::from_config(
            storage,
            self.config.crawl.use_local_screenshots,
            self.crawl_id.clone(),
        ) {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!("Remote screenshot storage unusable ({}), using local storage", e);
                let local = LocalScreenshots::new(&storage.screenshot_dir, &storage.public_path);
                Some(ScreenshotStore::new(self.crawl_id.clone(), vec![Arc::new(local)]))
            }
        }
    }

    async fn crawl(
        &self,
        engine: Arc<dyn BrowserEngine>,
        seed: Url,
        screenshots: Option<ScreenshotStore>,
    ) -> CrawlResult {
        let crawl = &self.config.crawl;
        let concurrency = crawl.concurrency.max(1);

        let contexts = ContextFactory::new(engine, &self.config.browser, crawl.skip_resources);
        let pipeline = Arc::new(PagePipeline::new(
            contexts,
            self.detectors.clone(),
            self.consent.clone(),
            screenshots,
            &self.config.browser,
            &seed,
        ));
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut progress = ProgressReporter::new(self.progress.clone());

        let mut frontier = Frontier::new(crawl.max_depth);
        let mut result = CrawlResult::default();
        frontier.enqueue(seed, 0);

        let mut wave = 0usize;
        loop {
            let remaining = crawl.max_pages.saturating_sub(result.pages.len());
            if remaining == 0 {
                tracing::info!("Page budget of {} reached", crawl.max_pages);
                break;
            }
            if frontier.is_empty() {
                tracing::info!("Frontier exhausted");
                break;
            }

            let batch_size = concurrency.min(remaining).min(frontier.len());
            let batch = frontier.next_batch(batch_size, |item| should_crawl(crawl, &item.url));
            if batch.is_empty() {
                continue;
            }

            wave += 1;
            tracing::debug!("Wave {}: dispatching {} pages", wave, batch.len());

            let outcomes = run_wave(&pipeline, &semaphore, batch).await;

            let mut crawled_in_wave = 0;
            for (item, outcome) in outcomes {
                match outcome {
                    PageOutcome::Crawled(page) => {
                        crawled_in_wave += 1;

                        if item.depth < crawl.max_depth {
                            for link in &page.links {
                                match Url::parse(link) {
                                    Ok(url) if should_crawl(crawl, &url) => {
                                        frontier.enqueue(url, item.depth + 1);
                                    }
                                    Ok(_) => {}
                                    Err(e) => tracing::debug!("Unparseable link {}: {}", link, e),
                                }
                            }
                        }

                        result.pages.push((*page).clone());
                        progress
                            .report(CrawlProgress {
                                crawled: result.pages.len(),
                                discovered: frontier.discovered_count(),
                                page: *page,
                            })
                            .await;
                    }
                    PageOutcome::Skipped { url, reason } => {
                        tracing::debug!("Skipped {}: {}", url, reason);
                    }
                    PageOutcome::Failed(error) => {
                        tracing::warn!("Failed {}: {}", error.url, error.error);
                        result.errors.push(error);
                    }
                }
            }

            tracing::info!(
                "Wave {} complete: {} crawled, {} total, {} queued",
                wave,
                crawled_in_wave,
                result.pages.len(),
                frontier.len()
            );

            if !frontier.is_empty() && result.pages.len() < crawl.max_pages {
                tokio::time::sleep(crawl.delay()).await;
            }
        }

        result
    }
}

/// Runs one wave in parallel and waits for every pipeline to finish
///
/// Outcomes are returned in dispatch order. A task that panicked is reported
/// as a failed page.
async fn run_wave(
    pipeline: &Arc<PagePipeline>,
    semaphore: &Arc<Semaphore>,
    batch: Vec<QueueItem>,
) -> Vec<(QueueItem, PageOutcome)> {
    let mut join_set = JoinSet::new();

    for (index, item) in batch.iter().cloned().enumerate() {
        let pipeline = Arc::clone(pipeline);
        let semaphore = Arc::clone(semaphore);

        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let outcome = pipeline.run(&item).await;
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<PageOutcome>> = batch.iter().map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(e) => tracing::error!("Page task failed: {}", e),
        }
    }

    batch
        .into_iter()
        .zip(slots)
        .map(|(item, outcome)| {
            let outcome = outcome.unwrap_or_else(|| {
                PageOutcome::Failed(CrawlError::new(item.url.as_str(), "page task aborted"))
            });
            (item, outcome)
        })
        .collect()
}
