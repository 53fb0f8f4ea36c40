//! Crawl progress stream
//!
//! The crawler publishes one [`CrawlProgress`] per completed page, after each
//! wave's barrier and in result-processing order. The channel is bounded, so a
//! slow consumer applies backpressure to the crawl loop; a dropped receiver
//! simply stops the reports.

use crate::crawler::types::CrawlPageResult;
use tokio::sync::mpsc;

/// Default capacity of [`progress_channel`]
pub const DEFAULT_PROGRESS_CAPACITY: usize = 64;

/// One progress report
#[derive(Debug, Clone)]
pub struct CrawlProgress {
    /// Pages crawled so far, including `page`
    pub crawled: usize,

    /// Distinct URLs discovered so far (visited or pending)
    pub discovered: usize,

    /// The page that just completed
    pub page: CrawlPageResult,
}

/// Creates a bounded progress channel
pub fn progress_channel(
    capacity: usize,
) -> (mpsc::Sender<CrawlProgress>, mpsc::Receiver<CrawlProgress>) {
    mpsc::channel(capacity.max(1))
}

/// Sending half held by the crawler
#[derive(Debug, Clone, Default)]
pub(crate) struct ProgressReporter {
    sender: Option<mpsc::Sender<CrawlProgress>>,
}

impl ProgressReporter {
    pub(crate) fn new(sender: Option<mpsc::Sender<CrawlProgress>>) -> Self {
        Self { sender }
    }

    pub(crate) async fn report(&mut self, progress: CrawlProgress) {
        let Some(sender) = &self.sender else {
            return;
        };

        if sender.send(progress).await.is_err() {
            tracing::debug!("Progress receiver dropped; no further reports");
            self.sender = None;
        }
    }
}
