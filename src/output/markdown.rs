//! Markdown report generation
//!
//! This module renders a human-readable markdown report of a finished crawl:
//! run information, counters and the accepted pages.

use crate::output::traits::{CrawlReport, OutputResult, StatsSink};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Stats sink that writes the markdown report to a file
#[derive(Debug, Clone)]
pub struct MarkdownReport {
    path: PathBuf,
}

impl MarkdownReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsSink for MarkdownReport {
    fn persist(&self, report: &CrawlReport) -> OutputResult<()> {
        write_markdown_report(report, &self.path)
    }
}

/// Writes the markdown report to `output_path`
///
/// # Arguments
///
/// * `report` - The crawl report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let mut md = String::new();
    let stats = &report.stats;

    md.push_str("# Bio-Harvest Crawl Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Elapsed**: {:.1} seconds\n",
        stats.elapsed.as_secs_f64()
    ));
    md.push_str(&format!("- **Outcome**: {}\n", report.outcome));
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Counters
    md.push_str("## Statistics\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!(
        "| Collected | {} / {} |\n",
        stats.collected_count, report.target_count
    ));
    md.push_str(&format!("| Visited | {} |\n", stats.visited_count));
    md.push_str(&format!("| Fetch Failures | {} |\n", stats.fetch_failures));
    md.push_str(&format!(
        "| Success Rate | {:.2}% |\n\n",
        report.success_rate() * 100.0
    ));

    md.push_str("## Accepted Pages\n\n");
    if report.accepted.is_empty() {
        md.push_str("No pages were accepted.\n");
    } else {
        for (i, page) in report.accepted.iter().enumerate() {
            md.push_str(&format!("{}. [{}]({})\n", i + 1, page.title, page.url));
        }
    }

    md
}
