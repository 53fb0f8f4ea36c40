//! Page detectors
//!
//! A detector is a side-effect-free analysis of one rendered page that yields a
//! structured result. The page pipeline consumes every detector through the
//! same [`Detector`] contract and never lets a failing detector fail the page:
//! a failure only leaves the corresponding result field empty.
//!
//! Detectors are split in two groups:
//! - the category detector runs on every page
//! - site detectors (technology, author, RSS, newsletter, social) describe the
//!   whole site and only run on the entry page

mod category;
mod site;

pub use category::HeuristicCategoryDetector;
pub use site::{
    AuthorDetector, NewsletterDetector, RssDetector, SocialLinksDetector, TechnologyDetector,
};

use crate::browser::{BrowserError, Page};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Errors raised by detectors
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Detection failed: {0}")]
    Failed(String),
}

/// Everything a detector may look at
pub struct PageSnapshot<'a> {
    /// The live page, for detectors that need to evaluate scripts
    pub page: &'a dyn Page,

    /// Normalized URL of the page
    pub url: &'a Url,

    /// Rendered HTML of the page
    pub html: &'a str,
}

/// A pluggable, page-scoped analysis
#[async_trait]
pub trait Detector: Send + Sync {
    type Output: Send;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn detect(&self, snapshot: &PageSnapshot<'_>) -> Result<Self::Output, DetectError>;
}

/// Kind of page, as judged by the category detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageCategory {
    Homepage,
    Contact,
    About,
    Blog,
    Article,
    Form,
    Document,
    Legal,
    Listing,
    Search,
    Other,
}

impl PageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homepage => "homepage",
            Self::Contact => "contact",
            Self::About => "about",
            Self::Blog => "blog",
            Self::Article => "article",
            Self::Form => "form",
            Self::Document => "document",
            Self::Legal => "legal",
            Self::Listing => "listing",
            Self::Search => "search",
            Self::Other => "other",
        }
    }
}

/// Structural characteristics of a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCharacteristics {
    pub has_form: bool,
    pub has_search: bool,
    pub has_login: bool,
    pub has_article: bool,
    pub has_table: bool,
    pub form_field_count: usize,
    pub heading_count: usize,
    pub image_count: usize,
    pub link_count: usize,
    pub word_count: usize,
}

/// Result of the category detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDetection {
    pub category: PageCategory,
    pub confidence: f32,
    pub characteristics: PageCharacteristics,
}

impl CategoryDetection {
    /// Placeholder used when the category detector is missing or failed
    pub fn unknown() -> Self {
        Self {
            category: PageCategory::Other,
            confidence: 0.0,
            characteristics: PageCharacteristics::default(),
        }
    }
}

/// A technology found in the site's markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Author or publisher signature of the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub name: String,
    /// Where the name was found (e.g. `meta[name=author]`)
    pub source: String,
}

/// Newsletter signup presence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterInfo {
    pub detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Link to one of the site's social profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

/// Shared handle to a detector producing `T`
pub type DynDetector<T> = Arc<dyn Detector<Output = T>>;

/// The set of detectors a crawl runs
///
/// Every slot is optional; an empty slot behaves like a detector that failed.
#[derive(Clone, Default)]
pub struct Detectors {
    pub category: Option<DynDetector<CategoryDetection>>,
    pub technology: Option<DynDetector<Vec<Technology>>>,
    pub author: Option<DynDetector<Option<AuthorInfo>>>,
    pub rss: Option<DynDetector<Option<String>>>,
    pub newsletter: Option<DynDetector<NewsletterInfo>>,
    pub social: Option<DynDetector<Vec<SocialLink>>>,
}

impl Detectors {
    /// No detectors at all
    pub fn none() -> Self {
        Self::default()
    }

    /// The built-in HTML heuristics
    pub fn builtin() -> Self {
        Self {
            category: Some(Arc::new(HeuristicCategoryDetector)),
            technology: Some(Arc::new(TechnologyDetector)),
            author: Some(Arc::new(AuthorDetector)),
            rss: Some(Arc::new(RssDetector)),
            newsletter: Some(Arc::new(NewsletterDetector)),
            social: Some(Arc::new(SocialLinksDetector)),
        }
    }
}

/// Runs an optional detector, converting any failure into `None`
pub async fn run_detector<T: Send>(
    detector: Option<&DynDetector<T>>,
    snapshot: &PageSnapshot<'_>,
) -> Option<T> {
    let detector = detector?;

    match detector.detect(snapshot).await {
        Ok(output) => Some(output),
        Err(e) => {
            tracing::warn!(
                "Detector '{}' failed on {}: {}",
                detector.name(),
                snapshot.url,
                e
            );
            None
        }
    }
}
