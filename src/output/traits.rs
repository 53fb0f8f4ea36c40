//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the crawl
//! summary they render.

use crate::crawler::{CrawlResult, SiteProfile};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Metadata about one crawl run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub crawl_id: String,
    pub start_url: String,
    pub config_hash: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Summary statistics for a crawl
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    // Run metadata
    pub run: RunInfo,
    pub duration_seconds: u64,

    // Overall statistics
    pub total_pages: u64,
    pub total_errors: u64,
    pub total_links: u64,
    pub screenshots: u64,

    // Depth breakdown (depth -> count)
    pub depth_breakdown: BTreeMap<u32, u64>,

    // Category breakdown (category -> count)
    pub category_breakdown: BTreeMap<String, u64>,

    // Site profile of the entry page
    pub site: Option<SiteProfile>,
}

impl CrawlSummary {
    /// Summarizes a crawl result
    pub fn from_result(result: &CrawlResult, run: RunInfo) -> Self {
        let mut depth_breakdown = BTreeMap::new();
        let mut category_breakdown = BTreeMap::new();

        for page in &result.pages {
            *depth_breakdown.entry(page.depth).or_insert(0) += 1;
            *category_breakdown
                .entry(page.category.as_str().to_string())
                .or_insert(0) += 1;
        }

        let duration_seconds = (run.finished_at - run.started_at).num_seconds().max(0) as u64;

        Self {
            duration_seconds,
            total_pages: result.pages.len() as u64,
            total_errors: result.errors.len() as u64,
            total_links: result.pages.iter().map(|p| p.links.len() as u64).sum(),
            screenshots: result
                .pages
                .iter()
                .filter(|p| p.screenshot_url.is_some())
                .count() as u64,
            depth_breakdown,
            category_breakdown,
            site: result.entry_page().and_then(|p| p.site.clone()),
            run,
        }
    }

    /// Returns the success rate as a percentage of attempted pages
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total_pages + self.total_errors;
        if attempted == 0 {
            return 0.0;
        }
        (self.total_pages as f64 / attempted as f64) * 100.0
    }
}

/// Trait for output handlers
///
/// An output handler persists a finished crawl in one format.
pub trait OutputHandler {
    /// Writes the crawl result and its summary
    ///
    /// # Arguments
    ///
    /// * `result` - Pages and errors of the crawl
    /// * `summary` - Statistics derived from `result`
    fn write(&self, result: &CrawlResult, summary: &CrawlSummary) -> OutputResult<()>;
}
