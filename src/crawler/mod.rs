//! Crawler module for fetching and archiving quote listings
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with charset transcoding
//! - Listing page parsing
//! - The per-feed pagination walk
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod walker;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, decode_body, PageFetcher};
pub use parser::{parse_listing, ParsedListing, Record};
pub use walker::{DatePagination, FeedOutcome, FeedWalker, IndexPagination, Pagination};

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::Result;

/// Runs a complete archiving pass
///
/// This is the main entry point. It will:
/// 1. Load the cursors from the state file
/// 2. Walk both feeds concurrently, saving new quotes
/// 3. Store the new cursors if both walks succeeded
///
/// # Arguments
///
/// * `config` - The archiver configuration
/// * `fresh` - Ignore the stored cursors
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Pass completed, state file updated
/// * `Err(ArchiverError)` - Pass failed, state file untouched
pub async fn crawl(config: Config, fresh: bool) -> Result<CrawlSummary> {
    Coordinator::new(config, fresh)?.run().await
}
