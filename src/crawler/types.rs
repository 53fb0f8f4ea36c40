//! Crawl data model

use crate::detect::{
    AuthorInfo, NewsletterInfo, PageCategory, PageCharacteristics, SocialLink, Technology,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A frontier entry: a normalized URL and its link depth from the start page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub url: Url,
    pub depth: u32,
}

impl QueueItem {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Detector outputs describing the whole site
///
/// Only the entry page (depth 0) carries a profile. A field is `None` when its
/// detector is not configured or failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<Technology>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rss_feed: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub newsletter: Option<NewsletterInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<Vec<SocialLink>>,
}

/// The result of one successful page visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlPageResult {
    /// Final document URL after redirects
    pub url: String,

    /// Dedup identity of the page
    pub normalized_url: String,

    pub created_at: DateTime<Utc>,

    pub title: Option<String>,

    pub depth: u32,

    pub category: PageCategory,

    pub confidence: f32,

    pub characteristics: PageCharacteristics,

    /// HTTP status of the main document
    pub status: u16,

    pub content_type: Option<String>,

    /// Navigation time in milliseconds
    pub response_time_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Site-level detector outputs (entry page only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteProfile>,

    /// Internal outbound links, absolute and deduplicated
    pub links: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A page that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlError {
    pub url: String,
    pub error: String,
}

impl CrawlError {
    pub fn new(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            error: error.to_string(),
        }
    }
}

/// Aggregate outcome of a crawl
///
/// Always returned, even when every page failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub pages: Vec<CrawlPageResult>,
    pub errors: Vec<CrawlError>,
}

impl CrawlResult {
    /// Pages at a given depth, in crawl order
    pub fn pages_at_depth(&self, depth: u32) -> impl Iterator<Item = &CrawlPageResult> {
        self.pages.iter().filter(move |page| page.depth == depth)
    }

    /// Returns the entry page, if it was crawled
    pub fn entry_page(&self) -> Option<&CrawlPageResult> {
        self.pages_at_depth(0).next()
    }
}

/// What a page pipeline produced for one queue item
#[derive(Debug)]
pub enum PageOutcome {
    /// The page was crawled
    Crawled(Box<CrawlPageResult>),

    /// The page was intentionally not processed (e.g. non-HTML content)
    Skipped { url: String, reason: String },

    /// The pipeline failed; the crawl continues
    Failed(CrawlError),
}
