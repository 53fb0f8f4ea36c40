//! Site-level detectors
//!
//! These describe the site rather than the page, so the pipeline only runs
//! them on the entry page.

use crate::crawler::extract::resolve_link;
use crate::detect::{
    AuthorInfo, DetectError, Detector, NewsletterInfo, PageSnapshot, SocialLink, Technology,
};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Markup fingerprints: (needle in HTML, name, category)
const TECH_FINGERPRINTS: &[(&str, &str, &str)] = &[
    ("/wp-content/", "WordPress", "cms"),
    ("/wp-includes/", "WordPress", "cms"),
    ("cdn.shopify.com", "Shopify", "ecommerce"),
    ("static.squarespace.com", "Squarespace", "cms"),
    ("static.wixstatic.com", "Wix", "cms"),
    ("/_next/", "Next.js", "framework"),
    ("__NEXT_DATA__", "Next.js", "framework"),
    ("/_nuxt/", "Nuxt", "framework"),
    ("data-reactroot", "React", "javascript"),
    ("ng-version", "Angular", "javascript"),
    ("data-v-app", "Vue.js", "javascript"),
    ("jquery", "jQuery", "javascript"),
    ("googletagmanager.com", "Google Tag Manager", "analytics"),
    ("google-analytics.com", "Google Analytics", "analytics"),
    ("plausible.io", "Plausible", "analytics"),
    ("cdn.tailwindcss.com", "Tailwind CSS", "css"),
    ("bootstrap.min.css", "Bootstrap", "css"),
    ("cloudflare", "Cloudflare", "cdn"),
];

/// Newsletter providers recognised from form actions or embeds
const NEWSLETTER_PROVIDERS: &[(&str, &str)] = &[
    ("list-manage.com", "Mailchimp"),
    ("mailchimp", "Mailchimp"),
    ("substack.com", "Substack"),
    ("convertkit", "ConvertKit"),
    ("buttondown.email", "Buttondown"),
    ("klaviyo", "Klaviyo"),
    ("sendinblue", "Brevo"),
    ("brevo", "Brevo"),
    ("beehiiv", "beehiiv"),
    ("mailerlite", "MailerLite"),
];

const NEWSLETTER_WORDS: &[&str] = &["newsletter", "subscribe", "sign up for", "mailing list"];

/// Social hosts and their platform names
const SOCIAL_HOSTS: &[(&str, &str)] = &[
    ("twitter.com", "twitter"),
    ("x.com", "twitter"),
    ("facebook.com", "facebook"),
    ("instagram.com", "instagram"),
    ("linkedin.com", "linkedin"),
    ("youtube.com", "youtube"),
    ("tiktok.com", "tiktok"),
    ("github.com", "github"),
    ("mastodon.social", "mastodon"),
    ("bsky.app", "bluesky"),
    ("threads.net", "threads"),
    ("pinterest.com", "pinterest"),
];

fn selector(css: &str) -> Result<Selector, DetectError> {
    Selector::parse(css).map_err(|e| DetectError::Failed(format!("bad selector {}: {:?}", css, e)))
}

fn attr_text(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Technology stack from the generator tag and markup fingerprints
#[derive(Debug, Clone, Copy, Default)]
pub struct TechnologyDetector;

#[async_trait]
impl Detector for TechnologyDetector {
    type Output = Vec<Technology>;

    fn name(&self) -> &'static str {
        "technology"
    }

    async fn detect(&self, snapshot: &PageSnapshot<'_>) -> Result<Vec<Technology>, DetectError> {
        detect_technologies(snapshot.html)
    }
}

pub(crate) fn detect_technologies(html: &str) -> Result<Vec<Technology>, DetectError> {
    let document = Html::parse_document(html);
    let mut found: Vec<Technology> = Vec::new();
    let mut seen = HashSet::new();

    let generator = selector("meta[name='generator']")?;
    for content in document
        .select(&generator)
        .filter_map(|el| attr_text(el, "content"))
    {
        // "WordPress 6.4.2" -> name + version
        let (name, version) = match content.rsplit_once(' ') {
            Some((name, version)) if version.starts_with(|c: char| c.is_ascii_digit()) => {
                (name.to_string(), Some(version.to_string()))
            }
            _ => (content.clone(), None),
        };
        if seen.insert(name.to_ascii_lowercase()) {
            found.push(Technology {
                name,
                category: "generator".to_string(),
                version,
            });
        }
    }

    let haystack = html.to_ascii_lowercase();
    for (needle, name, category) in TECH_FINGERPRINTS {
        if haystack.contains(&needle.to_ascii_lowercase()) && seen.insert(name.to_ascii_lowercase())
        {
            found.push(Technology {
                name: name.to_string(),
                category: category.to_string(),
                version: None,
            });
        }
    }

    Ok(found)
}

/// Author or publisher from meta tags and JSON-LD
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorDetector;

#[async_trait]
impl Detector for AuthorDetector {
    type Output = Option<AuthorInfo>;

    fn name(&self) -> &'static str {
        "author"
    }

    async fn detect(&self, snapshot: &PageSnapshot<'_>) -> Result<Option<AuthorInfo>, DetectError> {
        detect_author(snapshot.html)
    }
}

pub(crate) fn detect_author(html: &str) -> Result<Option<AuthorInfo>, DetectError> {
    let document = Html::parse_document(html);

    for (css, source) in [
        ("meta[name='author']", "meta[name=author]"),
        ("meta[property='article:author']", "meta[property=article:author]"),
        ("meta[name='copyright']", "meta[name=copyright]"),
    ] {
        let sel = selector(css)?;
        if let Some(name) = document
            .select(&sel)
            .find_map(|el| attr_text(el, "content"))
        {
            return Ok(Some(AuthorInfo {
                name,
                source: source.to_string(),
            }));
        }
    }

    let ld_json = selector("script[type='application/ld+json']")?;
    for script in document.select(&ld_json) {
        let text: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
            continue;
        };
        if let Some(name) = ld_json_name(&value, "author").or_else(|| ld_json_name(&value, "publisher"))
        {
            return Ok(Some(AuthorInfo {
                name,
                source: "json-ld".to_string(),
            }));
        }
    }

    Ok(None)
}

/// Finds `key` (an object with a `name`, or a string) anywhere in a JSON-LD tree
fn ld_json_name(value: &serde_json::Value, key: &str) -> Option<String> {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(found) = map.get(key) {
                let name = match found {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Object(inner) => {
                        inner.get("name").and_then(|n| n.as_str()).map(str::to_string)
                    }
                    serde_json::Value::Array(items) => items.iter().find_map(|item| {
                        item.get("name").and_then(|n| n.as_str()).map(str::to_string)
                    }),
                    _ => None,
                };
                if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                    return Some(name.trim().to_string());
                }
            }
            map.values().find_map(|v| ld_json_name(v, key))
        }
        serde_json::Value::Array(items) => items.iter().find_map(|v| ld_json_name(v, key)),
        _ => None,
    }
}

/// First advertised RSS/Atom feed
#[derive(Debug, Clone, Copy, Default)]
pub struct RssDetector;

#[async_trait]
impl Detector for RssDetector {
    type Output = Option<String>;

    fn name(&self) -> &'static str {
        "rss"
    }

    async fn detect(&self, snapshot: &PageSnapshot<'_>) -> Result<Option<String>, DetectError> {
        detect_rss(snapshot.html, snapshot.url)
    }
}

pub(crate) fn detect_rss(html: &str, base_url: &Url) -> Result<Option<String>, DetectError> {
    let document = Html::parse_document(html);
    let feeds = selector(
        "link[rel='alternate'][type='application/rss+xml'], \
         link[rel='alternate'][type='application/atom+xml'], \
         link[rel='alternate'][type='application/feed+json']",
    )?;

    Ok(document
        .select(&feeds)
        .filter_map(|el| el.value().attr("href"))
        .find_map(|href| resolve_link(href, base_url)))
}

/// Newsletter signup forms
#[derive(Debug, Clone, Copy, Default)]
pub struct NewsletterDetector;

#[async_trait]
impl Detector for NewsletterDetector {
    type Output = NewsletterInfo;

    fn name(&self) -> &'static str {
        "newsletter"
    }

    async fn detect(&self, snapshot: &PageSnapshot<'_>) -> Result<NewsletterInfo, DetectError> {
        detect_newsletter(snapshot.html)
    }
}

pub(crate) fn detect_newsletter(html: &str) -> Result<NewsletterInfo, DetectError> {
    let lower = html.to_ascii_lowercase();
    let provider = NEWSLETTER_PROVIDERS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, name)| name.to_string());

    let document = Html::parse_document(html);
    let forms = selector("form")?;
    let email_input = selector("input[type='email'], input[name*='email'], input[name*='EMAIL']")?;
    let password_input = selector("input[type='password']")?;

    let has_signup_form = document.select(&forms).any(|form| {
        if form.select(&email_input).next().is_none() {
            return false;
        }
        if form.select(&password_input).next().is_some() {
            return false;
        }
        let text = form.text().collect::<String>().to_lowercase();
        let action = form.value().attr("action").unwrap_or("").to_lowercase();
        NEWSLETTER_WORDS
            .iter()
            .any(|word| text.contains(word) || action.contains(word))
            || NEWSLETTER_PROVIDERS
                .iter()
                .any(|(needle, _)| action.contains(needle))
    });

    Ok(NewsletterInfo {
        detected: has_signup_form || provider.is_some(),
        provider,
    })
}

/// Links to the site's social profiles
#[derive(Debug, Clone, Copy, Default)]
pub struct SocialLinksDetector;

#[async_trait]
impl Detector for SocialLinksDetector {
    type Output = Vec<SocialLink>;

    fn name(&self) -> &'static str {
        "social"
    }

    async fn detect(&self, snapshot: &PageSnapshot<'_>) -> Result<Vec<SocialLink>, DetectError> {
        detect_social_links(snapshot.html, snapshot.url)
    }
}

pub(crate) fn detect_social_links(
    html: &str,
    base_url: &Url,
) -> Result<Vec<SocialLink>, DetectError> {
    let document = Html::parse_document(html);
    let anchors = selector("a[href]")?;
    let mut seen = HashSet::new();

    Ok(document
        .select(&anchors)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .filter_map(|link| {
            let parsed = Url::parse(&link).ok()?;
            let host = parsed.host_str()?.trim_start_matches("www.").to_string();
            let platform = SOCIAL_HOSTS
                .iter()
                .find(|(social_host, _)| {
                    host == *social_host || host.ends_with(&format!(".{}", social_host))
                })
                .map(|(_, platform)| platform.to_string())?;

            // Bare host links (share buttons, root pages) are not profiles
            let path = parsed.path().trim_matches('/');
            if path.is_empty() || path.starts_with("share") || path.starts_with("intent") {
                return None;
            }

            seen.insert(link.clone()).then_some(SocialLink {
                platform,
                url: link,
            })
        })
        .collect())
}
