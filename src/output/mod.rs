//! Output module for writing crawl results and summaries
//!
//! This module handles:
//! - Summarizing a crawl result (per-depth and per-category counts)
//! - Writing the full result as JSON
//! - Writing a human-readable markdown summary

mod json;
mod markdown;
mod traits;

pub use json::JsonOutput;
pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownOutput};
pub use traits::{CrawlSummary, OutputError, OutputHandler, OutputResult, RunInfo};

use crate::config::OutputConfig;
use crate::crawler::CrawlResult;

/// Builds the output handlers selected by the `[output]` section
pub fn handlers_for(config: &OutputConfig) -> Vec<Box<dyn OutputHandler>> {
    let mut handlers: Vec<Box<dyn OutputHandler>> =
        vec![Box::new(JsonOutput::new(&config.result_path))];
    if let Some(summary_path) = &config.summary_path {
        handlers.push(Box::new(MarkdownOutput::new(summary_path)));
    }
    handlers
}

/// Writes a finished crawl through every configured handler
///
/// # Arguments
///
/// * `config` - The output configuration
/// * `result` - The crawl result
/// * `run` - Metadata about the run
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Every output was written
/// * `Err(OutputError)` - An output could not be written
pub fn write_outputs(
    config: &OutputConfig,
    result: &CrawlResult,
    run: RunInfo,
) -> OutputResult<CrawlSummary> {
    let summary = CrawlSummary::from_result(result, run);

    for handler in handlers_for(config) {
        handler.write(result, &summary)?;
    }

    Ok(summary)
}
