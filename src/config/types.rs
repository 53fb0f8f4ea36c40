use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Lens
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration for `start_url` with every other value defaulted
    pub fn for_url(start_url: impl Into<String>) -> Self {
        Self {
            crawl: CrawlConfig::new(start_url),
            browser: BrowserConfig::default(),
            storage: StorageConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Crawl bounds and per-page behaviour.
///
/// This is the immutable snapshot taken at crawl start; the crawler shares it
/// behind an `Arc` and never mutates it.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Entry page of the site; its origin is the crawl boundary
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum link depth from the start page (start page is depth 0)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of page results to produce
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum number of page pipelines running at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Politeness delay between waves (milliseconds)
    #[serde(rename = "delay-between-requests", default = "default_delay")]
    pub delay_between_requests: u64,

    /// Abort image, font, stylesheet and media requests
    #[serde(rename = "skip-resources", default)]
    pub skip_resources: bool,

    /// Do not capture screenshots at all
    #[serde(rename = "skip-screenshots", default)]
    pub skip_screenshots: bool,

    /// Store screenshots on the local filesystem only
    #[serde(rename = "use-local-screenshots", default)]
    pub use_local_screenshots: bool,

    /// Allow-list of path patterns; empty means every path is allowed
    #[serde(rename = "include-paths", default)]
    pub include_paths: Vec<String>,

    /// Deny-list of path patterns
    #[serde(rename = "exclude-paths", default)]
    pub exclude_paths: Vec<String>,
}

impl CrawlConfig {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            concurrency: default_concurrency(),
            delay_between_requests: default_delay(),
            skip_resources: false,
            skip_screenshots: false,
            use_local_screenshots: false,
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
        }
    }

    /// Delay to sleep between waves
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests)
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// User agent announced by every browsing context
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Locale for every browsing context
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Per-navigation timeout (milliseconds)
    #[serde(rename = "navigation-timeout", default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// Upper bound on waiting for script-rendered content (milliseconds)
    #[serde(rename = "settle-timeout", default = "default_settle_timeout")]
    pub settle_timeout: u64,

    /// Viewport width in pixels
    #[serde(rename = "viewport-width", default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Viewport height in pixels
    #[serde(rename = "viewport-height", default = "default_viewport_height")]
    pub viewport_height: u32,
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            locale: default_locale(),
            navigation_timeout: default_navigation_timeout(),
            settle_timeout: default_settle_timeout(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

/// Screenshot storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for locally stored screenshots
    #[serde(rename = "screenshot-dir", default = "default_screenshot_dir")]
    pub screenshot_dir: String,

    /// Public path under which `screenshot-dir` is served
    #[serde(rename = "public-path", default = "default_public_path")]
    pub public_path: String,

    /// Remote blob storage endpoint
    #[serde(rename = "blob-endpoint", default)]
    pub blob_endpoint: Option<String>,

    /// Environment variable holding the blob storage credential
    #[serde(rename = "blob-token-env", default = "default_blob_token_env")]
    pub blob_token_env: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: default_screenshot_dir(),
            public_path: default_public_path(),
            blob_endpoint: None,
            blob_token_env: default_blob_token_env(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON crawl result
    #[serde(rename = "result-path", default = "default_result_path")]
    pub result_path: String,

    /// Path of the markdown summary, if one should be written
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_path: default_result_path(),
            summary_path: None,
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_pages() -> usize {
    50
}

fn default_concurrency() -> usize {
    3
}

fn default_delay() -> u64 {
    500
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; SumiLens/{}; site survey crawler)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_navigation_timeout() -> u64 {
    30_000
}

fn default_settle_timeout() -> u64 {
    2_000
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

fn default_screenshot_dir() -> String {
    "./public/screenshots".to_string()
}

fn default_public_path() -> String {
    "/screenshots".to_string()
}

fn default_blob_token_env() -> String {
    "BLOB_READ_WRITE_TOKEN".to_string()
}

fn default_result_path() -> String {
    "./crawl-result.json".to_string()
}
