//! In-memory browser engine for crawl tests
//!
//! Serves a fixed map of URL paths to canned responses and records every
//! interaction so tests can assert on dedup, concurrency and cleanup.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_lens::browser::{
    BrowserContext, BrowserEngine, BrowserError, BrowserLauncher, BrowserResult, ClickTarget,
    ContextOptions, NavigationResponse, Page, ResourceType, ScreenshotOptions,
};
use sumi_lens::Config;

pub const ORIGIN: &str = "https://site.test";

/// A canned response
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Html(String),
    Binary(&'static str),
    NoResponse,
    Error(String),
    Status(u16, String),
}

/// Builds a small HTML document linking to `links`
pub fn html(title: &str, links: &[&str]) -> FakeResponse {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    FakeResponse::Html(format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    ))
}

/// Everything the fake engine observed
#[derive(Debug, Default)]
pub struct Stats {
    pub launches: AtomicUsize,
    pub engine_closes: AtomicUsize,
    pub contexts_opened: AtomicUsize,
    pub contexts_closed: AtomicUsize,
    pub active_contexts: AtomicUsize,
    pub max_active_contexts: AtomicUsize,
    pub screenshots: AtomicUsize,
    pub clicks: AtomicUsize,
    pub visits: Mutex<Vec<String>>,
    pub blocked: Mutex<Vec<Vec<ResourceType>>>,
}

impl Stats {
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn visit_count(&self, path: &str) -> usize {
        let url = format!("{}{}", ORIGIN, path);
        self.visits().iter().filter(|v| **v == url).count()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Site definition plus engine behaviour switches
#[derive(Debug, Default)]
pub struct FakeSite {
    pages: HashMap<String, FakeResponse>,
    redirects: HashMap<String, String>,
    pub latency: Duration,
    pub fail_launch: bool,
    pub fail_screenshots: bool,
    /// Consent button the page accepts clicks on
    pub consent_target: Option<ClickTarget>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, path: &str, response: FakeResponse) -> Self {
        self.pages.insert(path.to_string(), response);
        self
    }

    /// Answers requests for `from` with a redirect to `to`
    ///
    /// `to` is a path on [`ORIGIN`] or an absolute URL on another site; pages
    /// on other sites are registered with their absolute URL.
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Follows redirects and returns the final URL with its response
    fn resolve(&self, requested: &str) -> (String, FakeResponse) {
        let mut current = requested.to_string();
        for _ in 0..5 {
            match self.redirects.get(&Self::key(&current)) {
                Some(to) if to.starts_with("http") => current = to.clone(),
                Some(to) => current = format!("{}{}", ORIGIN, to),
                None => break,
            }
        }

        let response = self
            .pages
            .get(&current)
            .or_else(|| self.pages.get(&Self::key(&current)))
            .cloned()
            .unwrap_or_else(|| FakeResponse::Status(404, "<html>not found</html>".to_string()));
        (current, response)
    }

    /// Path and query of a URL on [`ORIGIN`]; other sites keep the full URL
    fn key(url: &str) -> String {
        match url::Url::parse(url) {
            Ok(u) if url.starts_with(ORIGIN) => match u.query() {
                Some(query) => format!("{}?{}", u.path(), query),
                None => u.path().to_string(),
            },
            _ => url.to_string(),
        }
    }
}

/// Launcher handing out a [`FakeEngine`]
pub struct FakeLauncher {
    pub site: Arc<FakeSite>,
    pub stats: Arc<Stats>,
}

impl FakeLauncher {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            stats: Arc::new(Stats::default()),
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> BrowserResult<Arc<dyn BrowserEngine>> {
        self.stats.launches.fetch_add(1, Ordering::SeqCst);
        if self.site.fail_launch {
            return Err(BrowserError::Launch("no browser binary".to_string()));
        }
        Ok(Arc::new(FakeEngine {
            site: self.site.clone(),
            stats: self.stats.clone(),
        }))
    }
}

struct FakeEngine {
    site: Arc<FakeSite>,
    stats: Arc<Stats>,
}

#[async_trait]
impl BrowserEngine for FakeEngine {
    async fn new_context(&self, _options: &ContextOptions) -> BrowserResult<Box<dyn BrowserContext>> {
        self.stats.contexts_opened.fetch_add(1, Ordering::SeqCst);
        let active = self.stats.active_contexts.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats
            .max_active_contexts
            .fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(FakeContext {
            site: self.site.clone(),
            stats: self.stats.clone(),
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        self.stats.engine_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeContext {
    site: Arc<FakeSite>,
    stats: Arc<Stats>,
}

#[async_trait]
impl BrowserContext for FakeContext {
    async fn block_resources(&self, types: &[ResourceType]) -> BrowserResult<()> {
        self.stats.blocked.lock().unwrap().push(types.to_vec());
        Ok(())
    }

    async fn new_page(&self) -> BrowserResult<Box<dyn Page>> {
        Ok(Box::new(FakePage {
            site: self.site.clone(),
            stats: self.stats.clone(),
            html: Mutex::new(None),
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        self.stats.contexts_closed.fetch_add(1, Ordering::SeqCst);
        self.stats.active_contexts.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakePage {
    site: Arc<FakeSite>,
    stats: Arc<Stats>,
    html: Mutex<Option<String>>,
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> BrowserResult<Option<NavigationResponse>> {
        self.stats.visits.lock().unwrap().push(url.to_string());
        if !self.site.latency.is_zero() {
            tokio::time::sleep(self.site.latency).await;
        }

        let (final_url, response) = self.site.resolve(url);
        let (status, content_type, body) = match response {
            FakeResponse::Html(body) => (200, "text/html; charset=utf-8", body),
            FakeResponse::Status(status, body) => (status, "text/html", body),
            FakeResponse::Binary(content_type) => (200, content_type, String::new()),
            FakeResponse::NoResponse => return Ok(None),
            FakeResponse::Error(message) => {
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    message,
                })
            }
        };

        *self.html.lock().unwrap() = Some(body);
        Ok(Some(NavigationResponse {
            url: final_url,
            status,
            content_type: Some(content_type.to_string()),
        }))
    }

    async fn wait_for_settle(&self, _timeout: Duration) -> BrowserResult<()> {
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        self.html
            .lock()
            .unwrap()
            .clone()
            .ok_or(BrowserError::NoDocument)
    }

    async fn evaluate(&self, _script: &str) -> BrowserResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn click(&self, target: &ClickTarget) -> BrowserResult<bool> {
        let hit = self.site.consent_target.as_ref() == Some(target);
        if hit {
            self.stats.clicks.fetch_add(1, Ordering::SeqCst);
        }
        Ok(hit)
    }

    async fn screenshot(&self, _options: &ScreenshotOptions) -> BrowserResult<Vec<u8>> {
        self.stats.screenshots.fetch_add(1, Ordering::SeqCst);
        if self.site.fail_screenshots {
            return Err(BrowserError::Screenshot("renderer crashed".to_string()));
        }
        Ok(b"\x89PNG fake".to_vec())
    }
}

/// Test configuration: no delay, no screenshots
pub fn config() -> Config {
    let mut config = Config::for_url(format!("{}/", ORIGIN));
    config.crawl.delay_between_requests = 0;
    config.crawl.skip_screenshots = true;
    config
}
