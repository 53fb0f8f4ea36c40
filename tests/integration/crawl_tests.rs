//! Integration tests for the crawl loop
//!
//! These tests drive the crawler against the in-memory engine from `common`
//! and verify the crawl invariants end to end.

mod common;

use async_trait::async_trait;
use common::{config, html, FakeLauncher, FakeResponse, FakeSite, Stats, ORIGIN};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sumi_lens::artifact::{
    screenshot_name, ArtifactError, ArtifactResult, LocalScreenshots, ScreenshotBackend,
    ScreenshotStore,
};
use sumi_lens::browser::{ClickTarget, ResourceType};
use sumi_lens::crawler::{progress_channel, ConsentDismisser};
use sumi_lens::detect::{
    DetectError, Detector, Detectors, PageCategory, PageSnapshot, Technology,
};
use sumi_lens::{Config, CrawlResult, Crawler, LensError};
use tempfile::TempDir;

/// Small site: / -> /about, /blog; /blog -> /blog/post-1; /about -> /
fn small_site() -> FakeSite {
    FakeSite::new()
        .page("/", html("Home", &["/about", "/blog"]))
        .page("/about", html("About us", &["/"]))
        .page("/blog", html("Blog", &["/blog/post-1", "/"]))
        .page("/blog/post-1", html("Post one", &["/blog"]))
}

async fn crawl(config: Config, launcher: &Arc<FakeLauncher>) -> CrawlResult {
    Crawler::new(config, launcher.clone())
        .run()
        .await
        .expect("crawl should succeed")
}

fn normalized(result: &CrawlResult) -> HashSet<String> {
    result
        .pages
        .iter()
        .map(|p| p.normalized_url.clone())
        .collect()
}

fn url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

fn home_screenshot() -> String {
    screenshot_name(&url::Url::parse(&url("/")).unwrap())
}

#[tokio::test]
async fn test_depth_one_visits_start_and_its_links() {
    let site = FakeSite::new()
        .page("/", html("Home", &["/about"]))
        .page("/about", html("About", &["/team"]))
        .page("/team", html("Team", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let mut config = config();
    config.crawl.max_depth = 1;
    let result = crawl(config, &launcher).await;

    assert_eq!(
        normalized(&result),
        HashSet::from([url("/"), url("/about")])
    );
    assert!(result.errors.is_empty());
    assert_eq!(launcher.stats.visit_count("/team"), 0);
}

#[tokio::test]
async fn test_page_budget_of_one() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));

    let mut config = config();
    config.crawl.max_pages = 1;
    let result = crawl(config, &launcher).await;

    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.pages[0].normalized_url, url("/"));
    assert_eq!(launcher.stats.visits().len(), 1);
}

#[tokio::test]
async fn test_equivalent_links_crawled_once() {
    let site = FakeSite::new()
        .page(
            "/",
            html(
                "Home",
                &[
                    "/target",
                    "/target/",
                    "/target?utm_source=newsletter",
                    "/target#section",
                    "https://SITE.test/target?utm_campaign=x#top",
                ],
            ),
        )
        .page("/target", html("Target", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let mut config = config();
    config.crawl.concurrency = 5;
    let result = crawl(config, &launcher).await;

    assert_eq!(result.pages.len(), 2);
    assert_eq!(launcher.stats.visit_count("/target"), 1);

    let home = result.entry_page().expect("entry page");
    assert_eq!(home.links, vec![url("/target")]);
}

#[tokio::test]
async fn test_shared_target_of_sibling_pages_crawled_once() {
    let site = FakeSite::new()
        .page("/", html("Home", &["/left", "/right"]))
        .page("/left", html("Left", &["/shared"]))
        .page("/right", html("Right", &["/shared/?utm_medium=email"]))
        .page("/shared", html("Shared", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let mut config = config();
    config.crawl.concurrency = 2;
    let result = crawl(config, &launcher).await;

    assert_eq!(result.pages.len(), 4);
    assert_eq!(launcher.stats.visit_count("/shared"), 1);
    assert_eq!(result.pages_at_depth(2).count(), 1);
}

#[tokio::test]
async fn test_no_url_visited_twice() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));

    let mut config = config();
    config.crawl.concurrency = 3;
    let result = crawl(config, &launcher).await;

    let visits = launcher.stats.visits();
    let unique: HashSet<_> = visits.iter().collect();
    assert_eq!(visits.len(), unique.len());
    assert_eq!(result.pages.len(), 4);
}

#[tokio::test]
async fn test_depth_bound_and_page_budget_hold() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));

    let mut config = config();
    config.crawl.max_depth = 1;
    config.crawl.max_pages = 2;
    config.crawl.concurrency = 4;
    let result = crawl(config, &launcher).await;

    assert!(result.pages.len() <= 2);
    assert!(result.pages.iter().all(|p| p.depth <= 1));
    assert_eq!(result.pages_at_depth(0).count(), 1);
}

#[tokio::test]
async fn test_depths_follow_shortest_discovery() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));

    let result = crawl(config(), &launcher).await;

    let depth_of = |path: &str| {
        result
            .pages
            .iter()
            .find(|p| p.normalized_url == url(path))
            .map(|p| p.depth)
    };
    assert_eq!(depth_of("/"), Some(0));
    assert_eq!(depth_of("/about"), Some(1));
    assert_eq!(depth_of("/blog"), Some(1));
    assert_eq!(depth_of("/blog/post-1"), Some(2));
}

#[tokio::test]
async fn test_engine_closed_once_and_contexts_released() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));

    let mut config = config();
    config.crawl.concurrency = 2;
    crawl(config, &launcher).await;

    let stats = &launcher.stats;
    assert_eq!(Stats::count(&stats.launches), 1);
    assert_eq!(Stats::count(&stats.engine_closes), 1);
    assert_eq!(
        Stats::count(&stats.contexts_opened),
        Stats::count(&stats.contexts_closed)
    );
    assert_eq!(Stats::count(&stats.active_contexts), 0);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let mut site = FakeSite::new().latency(Duration::from_millis(20));
    let children: Vec<String> = (0..12).map(|i| format!("/page-{}", i)).collect();
    let links: Vec<&str> = children.iter().map(String::as_str).collect();
    site = site.page("/", html("Home", &links));
    for child in &children {
        site = site.page(child, html(child, &[]));
    }
    let launcher = Arc::new(FakeLauncher::new(site));

    let mut config = config();
    config.crawl.concurrency = 3;
    let result = crawl(config, &launcher).await;

    assert_eq!(result.pages.len(), 13);
    let max_active = Stats::count(&launcher.stats.max_active_contexts);
    assert!(max_active <= 3, "max active contexts was {}", max_active);
    assert!(max_active >= 2, "pages never ran in parallel");
}

#[tokio::test]
async fn test_launch_failure_is_fatal() {
    let mut site = small_site();
    site.fail_launch = true;
    let launcher = Arc::new(FakeLauncher::new(site));

    let err = Crawler::new(config(), launcher.clone())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, LensError::EngineLaunch(_)));
    assert_eq!(Stats::count(&launcher.stats.engine_closes), 0);
    assert!(launcher.stats.visits().is_empty());
}

#[tokio::test]
async fn test_non_html_pages_are_skipped_silently() {
    let site = FakeSite::new()
        .page("/", html("Home", &["/download", "/about"]))
        .page("/download", FakeResponse::Binary("application/octet-stream"))
        .page("/about", html("About", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let result = crawl(config(), &launcher).await;

    assert_eq!(normalized(&result), HashSet::from([url("/"), url("/about")]));
    assert!(result.errors.is_empty());
    assert_eq!(launcher.stats.visit_count("/download"), 1);
}

#[tokio::test]
async fn test_failed_pages_are_reported() {
    let site = FakeSite::new()
        .page("/", html("Home", &["/empty", "/broken", "/about"]))
        .page("/empty", FakeResponse::NoResponse)
        .page("/broken", FakeResponse::Error("net::ERR_CONNECTION_RESET".to_string()))
        .page("/about", html("About", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let result = crawl(config(), &launcher).await;

    assert_eq!(result.pages.len(), 2);
    assert_eq!(result.errors.len(), 2);

    let failed: HashSet<_> = result.errors.iter().map(|e| e.url.clone()).collect();
    assert_eq!(failed, HashSet::from([url("/empty"), url("/broken")]));

    let broken = result
        .errors
        .iter()
        .find(|e| e.url == url("/broken"))
        .expect("broken page error");
    assert!(broken.error.contains("ERR_CONNECTION_RESET"));
}

#[tokio::test]
async fn test_error_status_pages_are_still_results() {
    let site = FakeSite::new().page("/", html("Home", &["/missing"]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let result = crawl(config(), &launcher).await;

    let missing = result
        .pages
        .iter()
        .find(|p| p.normalized_url == url("/missing"))
        .expect("404 page is a result");
    assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn test_cross_origin_links_are_ignored() {
    let site = FakeSite::new()
        .page(
            "/",
            html(
                "Home",
                &[
                    "https://elsewhere.test/about",
                    "http://site.test/insecure",
                    "https://blog.site.test/",
                    "mailto:hello@site.test",
                    "/about",
                ],
            ),
        )
        .page("/about", html("About", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let result = crawl(config(), &launcher).await;

    assert_eq!(normalized(&result), HashSet::from([url("/"), url("/about")]));
    assert!(launcher
        .stats
        .visits()
        .iter()
        .all(|v| v.starts_with(ORIGIN)));
}

#[tokio::test]
async fn test_asset_links_are_never_visited() {
    let site = FakeSite::new()
        .page("/", html("Home", &["/report.pdf", "/logo.png", "/about"]))
        .page("/about", html("About", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    crawl(config(), &launcher).await;

    assert_eq!(launcher.stats.visit_count("/report.pdf"), 0);
    assert_eq!(launcher.stats.visit_count("/logo.png"), 0);
}

#[tokio::test]
async fn test_include_and_exclude_paths() {
    let site = FakeSite::new()
        .page("/", html("Home", &["/blog", "/blog/drafts", "/shop"]))
        .page("/blog", html("Blog", &[]))
        .page("/blog/drafts", html("Drafts", &[]))
        .page("/shop", html("Shop", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let mut config = config();
    config.crawl.include_paths = vec!["/".to_string()];
    config.crawl.exclude_paths = vec!["/blog/drafts".to_string(), "/shop".to_string()];
    let result = crawl(config, &launcher).await;

    assert_eq!(normalized(&result), HashSet::from([url("/"), url("/blog")]));
    assert_eq!(launcher.stats.visit_count("/shop"), 0);
}

#[tokio::test]
async fn test_excluded_seed_yields_empty_result() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));

    let mut config = config();
    config.crawl.include_paths = vec!["/docs".to_string()];
    let result = crawl(config, &launcher).await;

    assert!(result.pages.is_empty());
    assert!(result.errors.is_empty());
    assert!(launcher.stats.visits().is_empty());
    assert_eq!(Stats::count(&launcher.stats.engine_closes), 1);
}

#[tokio::test]
async fn test_progress_reported_per_page() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));
    let (sender, mut receiver) = progress_channel(64);

    let result = Crawler::new(config(), launcher.clone())
        .with_progress(sender)
        .run()
        .await
        .unwrap();

    let mut reports = Vec::new();
    while let Some(progress) = receiver.recv().await {
        reports.push(progress);
    }

    assert_eq!(reports.len(), result.pages.len());
    let crawled: Vec<usize> = reports.iter().map(|r| r.crawled).collect();
    assert_eq!(crawled, (1..=result.pages.len()).collect::<Vec<_>>());
    assert!(reports.iter().all(|r| r.discovered >= r.crawled));
    assert_eq!(reports[0].page.normalized_url, url("/"));
}

#[tokio::test]
async fn test_dropped_progress_receiver_does_not_stall() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));
    let (sender, receiver) = progress_channel(1);
    drop(receiver);

    let result = Crawler::new(config(), launcher.clone())
        .with_progress(sender)
        .run()
        .await
        .unwrap();

    assert_eq!(result.pages.len(), 4);
}

#[tokio::test]
async fn test_skip_resources_blocks_heavy_types() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));

    let mut config = config();
    config.crawl.skip_resources = true;
    config.crawl.max_pages = 2;
    crawl(config, &launcher).await;

    let blocked = launcher.stats.blocked.lock().unwrap().clone();
    assert_eq!(blocked.len(), 2);
    for types in blocked {
        for heavy in ResourceType::HEAVY {
            assert!(types.contains(&heavy));
        }
        assert!(!types.contains(&ResourceType::Document));
        assert!(!types.contains(&ResourceType::Script));
    }
}

#[tokio::test]
async fn test_resources_loaded_by_default() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));

    crawl(config(), &launcher).await;

    assert!(launcher.stats.blocked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_entry_page_carries_site_profile() {
    let site = FakeSite::new()
        .page(
            "/",
            FakeResponse::Html(
                r#"<html><head>
                    <title>Home</title>
                    <meta name="generator" content="WordPress 6.4">
                    <link rel="alternate" type="application/rss+xml" href="/feed">
                </head><body><a href="/about">About</a></body></html>"#
                    .to_string(),
            ),
        )
        .page("/about", html("About", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let result = crawl(config(), &launcher).await;

    let home = result.entry_page().expect("entry page");
    assert_eq!(home.category, PageCategory::Homepage);
    let site = home.site.as_ref().expect("site profile on entry page");
    assert_eq!(site.rss_feed.as_deref(), Some(url("/feed").as_str()));
    assert!(site
        .technologies
        .as_ref()
        .unwrap()
        .iter()
        .any(|t| t.name == "WordPress"));

    let about = result
        .pages
        .iter()
        .find(|p| p.normalized_url == url("/about"))
        .unwrap();
    assert!(about.site.is_none());
}

struct FailingTechnology;

#[async_trait]
impl Detector for FailingTechnology {
    type Output = Vec<Technology>;

    fn name(&self) -> &'static str {
        "failing-technology"
    }

    async fn detect(&self, _snapshot: &PageSnapshot<'_>) -> Result<Vec<Technology>, DetectError> {
        Err(DetectError::Failed("fingerprint database missing".to_string()))
    }
}

struct FailingCategory;

#[async_trait]
impl Detector for FailingCategory {
    type Output = sumi_lens::detect::CategoryDetection;

    fn name(&self) -> &'static str {
        "failing-category"
    }

    async fn detect(
        &self,
        _snapshot: &PageSnapshot<'_>,
    ) -> Result<sumi_lens::detect::CategoryDetection, DetectError> {
        Err(DetectError::Failed("model unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_failing_detectors_leave_fields_empty() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));
    let mut detectors = Detectors::builtin();
    detectors.technology = Some(Arc::new(FailingTechnology));
    detectors.category = Some(Arc::new(FailingCategory));

    let result = Crawler::new(config(), launcher.clone())
        .with_detectors(detectors)
        .run()
        .await
        .unwrap();

    assert_eq!(result.pages.len(), 4);
    assert!(result.errors.is_empty());
    assert!(result.pages.iter().all(|p| p.category == PageCategory::Other));

    let site = result.entry_page().unwrap().site.as_ref().unwrap();
    assert!(site.technologies.is_none());
    assert!(site.newsletter.is_some());
}

#[tokio::test]
async fn test_consent_overlay_dismissed() {
    let mut site = small_site();
    site.consent_target = Some(ClickTarget::Text("Accept all".to_string()));
    let launcher = Arc::new(FakeLauncher::new(site));

    let result = crawl(config(), &launcher).await;

    assert_eq!(Stats::count(&launcher.stats.clicks), result.pages.len());
}

#[tokio::test]
async fn test_consent_disabled() {
    let mut site = small_site();
    site.consent_target = Some(ClickTarget::Text("Accept all".to_string()));
    let launcher = Arc::new(FakeLauncher::new(site));

    Crawler::new(config(), launcher.clone())
        .with_consent(ConsentDismisser::disabled())
        .run()
        .await
        .unwrap();

    assert_eq!(Stats::count(&launcher.stats.clicks), 0);
}

/// Backend that counts calls and optionally fails
#[derive(Default)]
struct SpyBackend {
    puts: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl ScreenshotBackend for SpyBackend {
    fn name(&self) -> &'static str {
        "spy"
    }

    async fn put(&self, key: &str, _bytes: &[u8]) -> ArtifactResult<String> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ArtifactError::Remote {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(format!("https://cdn.test/{}", key))
    }

    async fn delete(&self, _key: &str) -> ArtifactResult<()> {
        Ok(())
    }

    async fn delete_prefix(&self, _prefix: &str) -> ArtifactResult<usize> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_skip_screenshots_never_touches_storage() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));
    let spy = Arc::new(SpyBackend::default());
    let store = ScreenshotStore::new("crawl-test", vec![spy.clone() as Arc<dyn ScreenshotBackend>]);

    let result = Crawler::new(config(), launcher.clone())
        .with_screenshot_store(store)
        .run()
        .await
        .unwrap();

    assert_eq!(spy.puts.load(Ordering::SeqCst), 0);
    assert_eq!(Stats::count(&launcher.stats.screenshots), 0);
    assert!(result.pages.iter().all(|p| p.screenshot_url.is_none()));
}

#[tokio::test]
async fn test_screenshots_stored_remotely() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));
    let spy = Arc::new(SpyBackend::default());
    let store = ScreenshotStore::new("crawl-test", vec![spy.clone() as Arc<dyn ScreenshotBackend>]);

    let mut config = config();
    config.crawl.skip_screenshots = false;
    let result = Crawler::new(config, launcher.clone())
        .with_screenshot_store(store)
        .run()
        .await
        .unwrap();

    assert_eq!(spy.puts.load(Ordering::SeqCst), 4);
    let home = result.entry_page().unwrap();
    assert_eq!(
        home.screenshot_url,
        Some(format!("https://cdn.test/crawl-test/{}", home_screenshot()))
    );
}

#[tokio::test]
async fn test_failed_upload_falls_back_to_local() {
    let dir = TempDir::new().unwrap();
    let launcher = Arc::new(FakeLauncher::new(small_site()));
    let remote = Arc::new(SpyBackend {
        fail: true,
        ..SpyBackend::default()
    });
    let local = Arc::new(LocalScreenshots::new(dir.path(), "/screenshots"));
    let store = ScreenshotStore::new(
        "crawl-test",
        vec![
            remote.clone() as Arc<dyn ScreenshotBackend>,
            local as Arc<dyn ScreenshotBackend>,
        ],
    );

    let mut config = config();
    config.crawl.skip_screenshots = false;
    let result = Crawler::new(config, launcher.clone())
        .with_screenshot_store(store)
        .run()
        .await
        .unwrap();

    assert_eq!(remote.puts.load(Ordering::SeqCst), 4);
    assert!(result.errors.is_empty());
    for page in &result.pages {
        let screenshot = page.screenshot_url.as_deref().expect("local screenshot");
        assert!(screenshot.starts_with("/screenshots/crawl-test/"));
    }
    assert!(dir.path().join("crawl-test").join(home_screenshot()).exists());
}

#[tokio::test]
async fn test_screenshot_failure_keeps_page() {
    let mut site = small_site();
    site.fail_screenshots = true;
    let launcher = Arc::new(FakeLauncher::new(site));
    let spy = Arc::new(SpyBackend::default());
    let store = ScreenshotStore::new("crawl-test", vec![spy.clone() as Arc<dyn ScreenshotBackend>]);

    let mut config = config();
    config.crawl.skip_screenshots = false;
    let result = Crawler::new(config, launcher.clone())
        .with_screenshot_store(store)
        .run()
        .await
        .unwrap();

    assert_eq!(result.pages.len(), 4);
    assert!(result.errors.is_empty());
    assert_eq!(spy.puts.load(Ordering::SeqCst), 0);
    assert!(result.pages.iter().all(|p| p.screenshot_url.is_none()));
}

#[tokio::test]
async fn test_relative_links_resolve_against_final_document_url() {
    let site = FakeSite::new()
        .page("/", html("Home", &["docs/"]))
        .redirect("/docs", "/docs/")
        .page("/docs/", html("Docs", &["guide", "./api?v=2", "../about"]))
        .page("/docs/guide", html("Guide", &[]))
        .page("/docs/api?v=2", html("API", &[]))
        .page("/about", html("About", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let result = crawl(config(), &launcher).await;

    let docs = result
        .pages
        .iter()
        .find(|p| p.normalized_url == url("/docs"))
        .expect("docs page");
    assert_eq!(docs.url, url("/docs/"));
    assert_eq!(
        docs.links,
        vec![url("/docs/guide"), url("/docs/api?v=2"), url("/about")]
    );

    assert_eq!(launcher.stats.visit_count("/docs/guide"), 1);
    assert_eq!(launcher.stats.visit_count("/guide"), 0);
    assert!(result.pages.iter().all(|p| p.status == 200));
}

#[tokio::test]
async fn test_redirect_off_origin_is_skipped() {
    let site = FakeSite::new()
        .page("/", html("Home", &["/out", "/about"]))
        .redirect("/out", "https://elsewhere.test/landing")
        .page("https://elsewhere.test/landing", html("Foreign", &["/x"]))
        .page("/about", html("About", &[]))
        .page("/x", html("Not linked from this site", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let mut config = config();
    config.crawl.max_pages = 2;
    let result = crawl(config, &launcher).await;

    assert_eq!(normalized(&result), HashSet::from([url("/"), url("/about")]));
    assert!(result.errors.is_empty());
    assert!(result.pages.iter().all(|p| p.url.starts_with(ORIGIN)));
    assert_eq!(launcher.stats.visit_count("/x"), 0);
}

#[tokio::test]
async fn test_internal_redirect_records_final_url() {
    let site = FakeSite::new()
        .page("/", html("Home", &["/old-about"]))
        .redirect("/old-about", "/about-us")
        .page("/about-us", html("About", &[]));
    let launcher = Arc::new(FakeLauncher::new(site));

    let result = crawl(config(), &launcher).await;

    let moved = result
        .pages
        .iter()
        .find(|p| p.normalized_url == url("/old-about"))
        .expect("redirected page");
    assert_eq!(moved.url, url("/about-us"));
    assert_eq!(moved.title.as_deref(), Some("About"));
}

struct PanickingSocial;

#[async_trait]
impl Detector for PanickingSocial {
    type Output = Vec<sumi_lens::detect::SocialLink>;

    fn name(&self) -> &'static str {
        "panicking-social"
    }

    async fn detect(
        &self,
        _snapshot: &PageSnapshot<'_>,
    ) -> Result<Vec<sumi_lens::detect::SocialLink>, DetectError> {
        panic!("detector bug")
    }
}

#[tokio::test]
async fn test_panicking_detector_releases_context() {
    let launcher = Arc::new(FakeLauncher::new(small_site()));
    let mut detectors = Detectors::builtin();
    detectors.social = Some(Arc::new(PanickingSocial));

    let result = Crawler::new(config(), launcher.clone())
        .with_detectors(detectors)
        .run()
        .await
        .unwrap();

    // Site detectors only run on the entry page
    assert!(result.pages.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].url, url("/"));
    assert!(result.errors[0].error.contains("panicked"));

    let stats = &launcher.stats;
    assert_eq!(Stats::count(&stats.contexts_opened), 1);
    assert_eq!(Stats::count(&stats.contexts_closed), 1);
    assert_eq!(Stats::count(&stats.engine_closes), 1);
}
