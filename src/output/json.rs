//! JSON crawl report

use crate::crawler::CrawlResult;
use crate::output::traits::{CrawlSummary, OutputHandler, OutputResult};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Shape of the JSON file
#[derive(Serialize)]
struct Report<'a> {
    summary: &'a CrawlSummary,
    pages: &'a [crate::crawler::CrawlPageResult],
    errors: &'a [crate::crawler::CrawlError],
}

/// Writes the full crawl result as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonOutput {
    path: PathBuf,
}

impl JsonOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for JsonOutput {
    fn write(&self, result: &CrawlResult, summary: &CrawlSummary) -> OutputResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let report = Report {
            summary,
            pages: &result.pages,
            errors: &result.errors,
        };

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(())
    }
}
