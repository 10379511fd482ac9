//! Run summary reporting
//!
//! This module holds the counters of a finished pass and prints them the way
//! the command line reports them.

use crate::state::CrawlState;
use std::time::Duration;

/// Outcome of a successful archiving pass
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Quotes written from the main feed
    pub main_saved: usize,

    /// Quotes written from the abyss-best feed
    pub abyss_best_saved: usize,

    /// Listing pages fetched across both feeds
    pub pages_fetched: usize,

    /// Cursors written to the state file
    pub state: CrawlState,

    /// Wall-clock time of the pass
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn total_saved(&self) -> usize {
        self.main_saved + self.abyss_best_saved
    }
}

/// Formats the summary as printed on success
pub fn format_summary(summary: &CrawlSummary) -> String {
    format!(
        "All quotes were processed. Saved {} quotes from the main page and {} quotes from the abyss best page.\n\
         Pages fetched: {}\n\
         Cursors: main {}, abyss best {}\n\
         Processing time: {:.3}s",
        summary.main_saved,
        summary.abyss_best_saved,
        summary.pages_fetched,
        summary.state.main,
        summary.state.abyss_best,
        summary.elapsed.as_secs_f64()
    )
}

/// Prints the summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("{}", format_summary(summary));
}
