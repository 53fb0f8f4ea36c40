//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, the page list, the site profile and error reports.

use crate::crawler::CrawlResult;
use crate::output::traits::{CrawlSummary, OutputHandler, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes a markdown summary to a file
#[derive(Debug, Clone)]
pub struct MarkdownOutput {
    path: PathBuf,
}

impl MarkdownOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for MarkdownOutput {
    fn write(&self, result: &CrawlResult, summary: &CrawlSummary) -> OutputResult<()> {
        generate_markdown_summary(result, summary, &self.path)
    }
}

/// Generates a markdown summary of a crawl
///
/// # Arguments
///
/// * `result` - The crawl result
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    result: &CrawlResult,
    summary: &CrawlSummary,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(result, summary);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Escapes characters that would break a table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(result: &CrawlResult, summary: &CrawlSummary) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Sumi-Lens Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Crawl ID**: {}\n", summary.run.crawl_id));
    md.push_str(&format!("- **Start URL**: {}\n", summary.run.start_url));
    md.push_str(&format!("- **Started**: {}\n", summary.run.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.run.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        summary.duration_seconds,
        summary.duration_seconds as f64 / 60.0
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.run.config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Crawled**: {}\n", summary.total_pages));
    md.push_str(&format!("- **Errors**: {}\n", summary.total_errors));
    md.push_str(&format!("- **Internal Links**: {}\n", summary.total_links));
    md.push_str(&format!("- **Screenshots**: {}\n", summary.screenshots));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    // Depth breakdown
    if !summary.depth_breakdown.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &summary.depth_breakdown {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    // Category breakdown
    if !summary.category_breakdown.is_empty() {
        md.push_str("## Category Breakdown\n\n");
        md.push_str("| Category | Pages |\n");
        md.push_str("|----------|-------|\n");
        for (category, count) in &summary.category_breakdown {
            md.push_str(&format!("| {} | {} |\n", category, count));
        }
        md.push('\n');
    }

    // Site profile
    if let Some(site) = &summary.site {
        md.push_str("## Site Profile\n\n");
        if let Some(technologies) = site.technologies.as_ref().filter(|t| !t.is_empty()) {
            let names: Vec<String> = technologies
                .iter()
                .map(|t| match &t.version {
                    Some(version) => format!("{} {}", t.name, version),
                    None => t.name.clone(),
                })
                .collect();
            md.push_str(&format!("- **Technologies**: {}\n", names.join(", ")));
        }
        if let Some(author) = &site.author {
            md.push_str(&format!("- **Author**: {} ({})\n", author.name, author.source));
        }
        if let Some(feed) = &site.rss_feed {
            md.push_str(&format!("- **RSS Feed**: {}\n", feed));
        }
        if let Some(newsletter) = site.newsletter.as_ref().filter(|n| n.detected) {
            match &newsletter.provider {
                Some(provider) => md.push_str(&format!("- **Newsletter**: yes ({})\n", provider)),
                None => md.push_str("- **Newsletter**: yes\n"),
            }
        }
        if let Some(social) = site.social_links.as_ref().filter(|s| !s.is_empty()) {
            md.push_str("- **Social**:\n");
            for link in social {
                md.push_str(&format!("  - {}: {}\n", link.platform, link.url));
            }
        }
        md.push('\n');
    }

    // Pages
    if !result.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| Depth | URL | Title | Category | Status |\n");
        md.push_str("|-------|-----|-------|----------|--------|\n");

        let mut pages: Vec<_> = result.pages.iter().collect();
        pages.sort_by_key(|p| p.depth);

        for page in pages {
            md.push_str(&format!(
                "| {} | {} | {} | {} ({:.0}%) | {} |\n",
                page.depth,
                page.normalized_url,
                cell(page.title.as_deref().unwrap_or("")),
                page.category.as_str(),
                page.confidence * 100.0,
                page.status
            ));
        }
        md.push('\n');
    }

    // Errors
    if !result.errors.is_empty() {
        md.push_str("## Errors\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");
        for error in &result.errors {
            md.push_str(&format!("| {} | {} |\n", error.url, cell(&error.error)));
        }
        md.push('\n');
    }

    md
}
