//! Output module for crawl reports and statistics
//!
//! This module handles:
//! - The [`StatsSink`] interface the coordinator hands its final report to
//! - Recording run records in SQLite
//! - Writing markdown reports
//! - Printing statistics to the console

mod markdown;
mod sqlite_output;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_report, write_markdown_report, MarkdownReport};
pub use stats::{load_latest_run, print_report, print_run, RunStatistics};
pub use traits::{CrawlReport, OutputError, OutputResult, StatsSink};
