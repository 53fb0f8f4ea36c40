//! Per-page workflow
//!
//! One invocation owns one browsing context and shares nothing mutable with
//! other invocations. Steps:
//!
//! 1. Navigate (bounded timeout); no response is an error, a redirect off
//!    the crawl origin or a non-HTML document is a skip
//! 2. Wait for script-rendered content to settle
//! 3. Title and category detection
//! 4. Site-level detectors (entry page only)
//! 5. Meta description
//! 6. Internal outbound links, deduplicated
//! 7. Consent overlay dismissal (best effort)
//! 8. Screenshot through the artifact store (best effort)
//!
//! Links and site-level detectors resolve against the final document URL
//! after redirects. Failures in steps 1-6 become a [`PageOutcome::Failed`];
//! detector, consent and screenshot failures only leave their fields empty.

use crate::artifact::ScreenshotStore;
use crate::browser::{BrowserContext, BrowserError, Page, ScreenshotOptions};
use crate::config::BrowserConfig;
use crate::crawler::consent::ConsentDismisser;
use crate::crawler::context::ContextFactory;
use crate::crawler::extract::parse_document;
use crate::crawler::types::{CrawlError, CrawlPageResult, PageOutcome, QueueItem, SiteProfile};
use crate::detect::{run_detector, CategoryDetection, Detectors, PageSnapshot};
use crate::url::{is_internal, normalize_url};
use chrono::Utc;
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use url::{Origin, Url};

/// Runs the page workflow for queue items
pub struct PagePipeline {
    contexts: ContextFactory,
    detectors: Detectors,
    consent: ConsentDismisser,
    screenshots: Option<ScreenshotStore>,
    origin: Origin,
    navigation_timeout: Duration,
    settle_timeout: Duration,
}

impl PagePipeline {
    /// Creates a pipeline for the site rooted at `start_url`
    ///
    /// `screenshots` is `None` when screenshots are disabled; the artifact
    /// store is then never touched.
    pub fn new(
        contexts: ContextFactory,
        detectors: Detectors,
        consent: ConsentDismisser,
        screenshots: Option<ScreenshotStore>,
        browser: &BrowserConfig,
        start_url: &Url,
    ) -> Self {
        Self {
            contexts,
            detectors,
            consent,
            screenshots,
            origin: start_url.origin(),
            navigation_timeout: browser.navigation_timeout(),
            settle_timeout: browser.settle_timeout(),
        }
    }

    /// Processes one queue item inside a fresh context
    ///
    /// The context is always closed, whatever the outcome.
    pub async fn run(&self, item: &QueueItem) -> PageOutcome {
        let context = match self.contexts.create().await {
            Ok(context) => context,
            Err(e) => return PageOutcome::Failed(CrawlError::new(item.url.as_str(), e)),
        };

        // A panicking detector or matcher must still release the context
        let outcome = AssertUnwindSafe(self.visit(context.as_ref(), item))
            .catch_unwind()
            .await;

        if let Err(e) = context.close().await {
            tracing::debug!("Failed to close context for {}: {}", item.url, e);
        }

        match outcome {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => PageOutcome::Failed(CrawlError::new(item.url.as_str(), e)),
            Err(_) => {
                tracing::error!("Page pipeline panicked on {}", item.url);
                PageOutcome::Failed(CrawlError::new(item.url.as_str(), "page pipeline panicked"))
            }
        }
    }

    async fn visit(
        &self,
        context: &dyn BrowserContext,
        item: &QueueItem,
    ) -> Result<PageOutcome, BrowserError> {
        let page = context.new_page().await?;
        let page = page.as_ref();

        let started = Instant::now();
        let response = page
            .goto(item.url.as_str(), self.navigation_timeout)
            .await?
            .ok_or_else(|| BrowserError::Navigation {
                url: item.url.to_string(),
                message: "no response".to_string(),
            })?;
        let response_time = started.elapsed();

        // Links resolve against the document as served, not the frontier key
        let document_url = Url::parse(&response.url).map_err(|e| BrowserError::Navigation {
            url: item.url.to_string(),
            message: format!("invalid final URL '{}': {}", response.url, e),
        })?;

        if !is_internal(&self.origin, &document_url) {
            tracing::debug!("Skipping {} (redirected off-origin to {})", item.url, document_url);
            return Ok(PageOutcome::Skipped {
                url: item.url.to_string(),
                reason: format!("redirected off-origin to {}", document_url),
            });
        }

        if !response.is_html() {
            let content_type = response.content_type.unwrap_or_default();
            tracing::debug!("Skipping {} (content type '{}')", item.url, content_type);
            return Ok(PageOutcome::Skipped {
                url: item.url.to_string(),
                reason: format!("non-HTML content type '{}'", content_type),
            });
        }

        if let Err(e) = page.wait_for_settle(self.settle_timeout).await {
            tracing::debug!("Settle wait for {} ended early: {}", item.url, e);
        }

        let html = page.content().await?;
        let parsed = parse_document(&html, &document_url);
        let snapshot = PageSnapshot {
            page,
            url: &document_url,
            html: &html,
        };

        let CategoryDetection {
            category,
            confidence,
            characteristics,
        } = run_detector(self.detectors.category.as_ref(), &snapshot)
            .await
            .unwrap_or_else(CategoryDetection::unknown);

        let site = if item.depth == 0 {
            Some(self.detect_site(&snapshot).await)
        } else {
            None
        };

        let links = self.internal_links(&document_url, &parsed.links);

        self.consent.dismiss(page).await;

        let screenshot_url = self.capture(page, &item.url).await;

        let result = CrawlPageResult {
            url: response.url,
            normalized_url: item.url.to_string(),
            created_at: Utc::now(),
            title: parsed.title,
            depth: item.depth,
            category,
            confidence,
            characteristics,
            status: response.status,
            content_type: response.content_type,
            response_time_ms: response_time.as_millis() as u64,
            screenshot_url,
            description: parsed.description,
            site,
            links,
            error: None,
        };

        Ok(PageOutcome::Crawled(Box::new(result)))
    }

    /// Runs every site-level detector; a failure only empties its field
    async fn detect_site(&self, snapshot: &PageSnapshot<'_>) -> SiteProfile {
        let detectors = &self.detectors;

        SiteProfile {
            technologies: run_detector(detectors.technology.as_ref(), snapshot).await,
            author: run_detector(detectors.author.as_ref(), snapshot)
                .await
                .flatten(),
            rss_feed: run_detector(detectors.rss.as_ref(), snapshot).await.flatten(),
            newsletter: run_detector(detectors.newsletter.as_ref(), snapshot).await,
            social_links: run_detector(detectors.social.as_ref(), snapshot).await,
        }
    }

    /// Normalizes links, keeps same-origin ones and dedups them in order
    fn internal_links(&self, page_url: &Url, links: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();

        links
            .iter()
            .filter_map(|link| normalize_url(page_url, link).ok())
            .filter(|url| is_internal(&self.origin, url))
            .map(String::from)
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    async fn capture(&self, page: &dyn Page, url: &Url) -> Option<String> {
        let store = self.screenshots.as_ref()?;

        let bytes = match page
            .screenshot(&ScreenshotOptions { full_page: false })
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Screenshot of {} failed: {}", url, e);
                return None;
            }
        };

        store.store(url, &bytes).await
    }
}
