//! Output module for reporting archiving passes

pub mod stats;

pub use stats::{format_summary, print_summary, CrawlSummary};
