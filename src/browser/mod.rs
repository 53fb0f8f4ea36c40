//! Browser automation contract
//!
//! The crawler never talks to a browser directly. It drives these narrow async
//! traits instead:
//! - `BrowserLauncher` starts an engine (the only fatal failure of a crawl)
//! - `BrowserEngine` hands out isolated browsing contexts
//! - `BrowserContext` owns cookies/state for exactly one page visit
//! - `Page` navigates, exposes the rendered document and captures screenshots
//!
//! `HttpBrowser` is the built-in engine: it renders static HTML over HTTP and
//! reports script evaluation and screenshots as unsupported.

mod http;

pub use http::{HttpBrowser, HttpLauncher};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a browser engine
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("No document loaded in page")]
    NoDocument,

    #[error("Operation not supported by this engine: {0}")]
    Unsupported(&'static str),

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Context error: {0}")]
    Context(String),
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Kinds of sub-resource a page may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Fetch,
    Other,
}

impl ResourceType {
    /// Resources aborted when `skip-resources` is enabled
    pub const HEAVY: [ResourceType; 4] = [
        ResourceType::Image,
        ResourceType::Font,
        ResourceType::Stylesheet,
        ResourceType::Media,
    ];
}

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Options for a new browsing context
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub user_agent: String,
    pub locale: String,
    pub viewport: Viewport,
}

/// Main-document response of a navigation
#[derive(Debug, Clone)]
pub struct NavigationResponse {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
}

impl NavigationResponse {
    /// Returns true if the response carries an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            })
            .unwrap_or(false)
    }
}

/// Element to click, either by CSS selector or by visible button text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    Selector(String),
    Text(String),
}

/// Screenshot capture options
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenshotOptions {
    /// Capture the full scrollable page rather than the viewport
    pub full_page: bool,
}

/// Starts a browser engine
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> BrowserResult<Arc<dyn BrowserEngine>>;
}

/// A running browser engine, shared by all concurrent page pipelines
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Opens a fresh, isolated browsing context
    async fn new_context(&self, options: &ContextOptions) -> BrowserResult<Box<dyn BrowserContext>>;

    /// Shuts the engine down
    async fn close(&self) -> BrowserResult<()>;
}

/// An isolated browsing session (cookies, storage, interception rules)
#[async_trait]
pub trait BrowserContext: Send + Sync {
    /// Aborts every request of the given resource types before it transfers
    async fn block_resources(&self, types: &[ResourceType]) -> BrowserResult<()>;

    async fn new_page(&self) -> BrowserResult<Box<dyn Page>>;

    async fn close(&self) -> BrowserResult<()>;
}

/// A single tab inside a browsing context
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigates to `url` and waits for the DOM to be ready.
    ///
    /// `Ok(None)` means the navigation produced no main-document response.
    async fn goto(&self, url: &str, timeout: Duration) -> BrowserResult<Option<NavigationResponse>>;

    /// Waits (up to `timeout`) for script-rendered content to settle
    async fn wait_for_settle(&self, timeout: Duration) -> BrowserResult<()>;

    /// Serialized HTML of the current document
    async fn content(&self) -> BrowserResult<String>;

    /// Evaluates a script in the page and returns its JSON result
    async fn evaluate(&self, script: &str) -> BrowserResult<serde_json::Value>;

    /// Clicks the first visible element matching `target`.
    ///
    /// Returns `Ok(false)` when nothing matched.
    async fn click(&self, target: &ClickTarget) -> BrowserResult<bool>;

    async fn screenshot(&self, options: &ScreenshotOptions) -> BrowserResult<Vec<u8>>;
}
