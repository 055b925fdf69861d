//! Output module for crawl reports and statistics
//!
//! This module handles:
//! - Summarizing a finished crawl pass for the terminal
//! - Loading and printing database statistics for `--stats`

mod report;
pub mod stats;

pub use report::{format_report, print_report};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
