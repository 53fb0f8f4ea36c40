//! Heuristic page classifier
//!
//! Combines URL path hints with the structure of the document. Path hints are
//! strong evidence; structure alone yields lower confidence.

use crate::detect::{
    CategoryDetection, DetectError, Detector, PageCategory, PageCharacteristics, PageSnapshot,
};
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

/// Path keywords and the category they imply, checked in order
const PATH_HINTS: &[(&str, PageCategory)] = &[
    ("contact", PageCategory::Contact),
    ("kontakt", PageCategory::Contact),
    ("about", PageCategory::About),
    ("team", PageCategory::About),
    ("privacy", PageCategory::Legal),
    ("terms", PageCategory::Legal),
    ("imprint", PageCategory::Legal),
    ("impressum", PageCategory::Legal),
    ("legal", PageCategory::Legal),
    ("cookie", PageCategory::Legal),
    ("search", PageCategory::Search),
    ("blog", PageCategory::Blog),
    ("news", PageCategory::Blog),
    ("docs", PageCategory::Document),
    ("documentation", PageCategory::Document),
    ("guide", PageCategory::Document),
    ("apply", PageCategory::Form),
    ("register", PageCategory::Form),
    ("signup", PageCategory::Form),
];

/// Classifies pages from their URL and HTML structure
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCategoryDetector;

#[async_trait]
impl Detector for HeuristicCategoryDetector {
    type Output = CategoryDetection;

    fn name(&self) -> &'static str {
        "category"
    }

    async fn detect(&self, snapshot: &PageSnapshot<'_>) -> Result<CategoryDetection, DetectError> {
        Ok(classify(snapshot.url, snapshot.html))
    }
}

/// Classifies a page synchronously
pub(crate) fn classify(url: &Url, html: &str) -> CategoryDetection {
    let characteristics = characteristics(html);
    let (category, confidence) = categorize(url, &characteristics);

    CategoryDetection {
        category,
        confidence,
        characteristics,
    }
}

fn categorize(url: &Url, c: &PageCharacteristics) -> (PageCategory, f32) {
    let path = url.path().to_ascii_lowercase();

    if path == "/" || path.is_empty() {
        return (PageCategory::Homepage, 0.9);
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    for (keyword, category) in PATH_HINTS {
        if segments.iter().any(|segment| segment.contains(keyword)) {
            // A post under /blog/ is an article, not the blog index
            if *category == PageCategory::Blog && segments.len() > 1 && c.has_article {
                return (PageCategory::Article, 0.85);
            }
            return (*category, 0.8);
        }
    }

    if c.has_search && c.form_field_count <= 2 && c.link_count > 20 {
        return (PageCategory::Search, 0.5);
    }
    if c.has_form && c.form_field_count >= 4 && !c.has_login {
        return (PageCategory::Form, 0.6);
    }
    if c.has_article && c.word_count >= 300 {
        return (PageCategory::Article, 0.6);
    }
    if c.link_count >= 40 && c.word_count < c.link_count * 15 {
        return (PageCategory::Listing, 0.4);
    }
    if c.heading_count >= 5 && c.word_count >= 800 {
        return (PageCategory::Document, 0.4);
    }

    (PageCategory::Other, 0.2)
}

fn characteristics(html: &str) -> PageCharacteristics {
    let document = Html::parse_document(html);

    let count = |selector: &str| -> usize {
        Selector::parse(selector)
            .map(|s| document.select(&s).count())
            .unwrap_or(0)
    };

    let word_count = Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next())
        .map(|body| {
            body.text()
                .map(|text| text.split_whitespace().count())
                .sum()
        })
        .unwrap_or(0);

    PageCharacteristics {
        has_form: count("form") > 0,
        has_search: count("input[type='search'], form[role='search'], [role='search']") > 0,
        has_login: count("input[type='password']") > 0,
        has_article: count("article") > 0,
        has_table: count("table") > 0,
        form_field_count: count("form input:not([type='hidden']), form textarea, form select"),
        heading_count: count("h1, h2, h3, h4, h5, h6"),
        image_count: count("img"),
        link_count: count("a[href]"),
        word_count,
    }
}
