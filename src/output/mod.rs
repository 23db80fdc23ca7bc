//! Output module for crawl reports
//!
//! This module handles:
//! - Counting what a crawl run did
//! - Summarizing the stored accessible sites
//! - Exporting the accessible sites as markdown

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_summary, summarize, CrawlStatistics, SiteSummary};
