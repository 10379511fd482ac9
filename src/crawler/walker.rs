//! Feed walker - the per-feed incremental pagination loop
//!
//! A walker starts at the newest page of a feed and moves toward older pages
//! until it reaches a page whose newest quote is already covered by the
//! cursor, or until the feed's pagination runs out.

use crate::crawler::parser::{parse_listing, ParsedListing, Record};
use crate::crawler::PageFetcher;
use crate::state::{Cursor, IdOrdering};
use crate::storage::RecordSink;
use crate::ArchiverError;
use chrono::{Months, NaiveDate};
use std::fmt;

/// How a feed moves from one page to the next older one
pub trait Pagination: fmt::Display + Send {
    /// URL of the page at the current reference
    fn url(&self, base_url: &str) -> String;

    /// Whether the current reference still points at a page worth visiting
    fn has_more(&self) -> bool;

    /// Called once with the first page, before the first `advance`
    fn discover(&mut self, _listing: &ParsedListing) {}

    /// Moves the reference one page toward older content
    fn advance(&mut self);
}

/// Page-number pagination of the main feed
///
/// The front page has no number; its number is the total page count, read
/// from the pager. Older pages have smaller numbers down to 1.
#[derive(Debug, Clone, Default)]
pub struct IndexPagination {
    page: Option<u32>,
}

impl IndexPagination {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn page(&self) -> Option<u32> {
        self.page
    }
}

impl Pagination for IndexPagination {
    fn url(&self, base_url: &str) -> String {
        match self.page {
            Some(page) => format!("{}/{}", base_url.trim_end_matches('/'), page),
            None => base_url.to_string(),
        }
    }

    fn has_more(&self) -> bool {
        matches!(self.page, Some(page) if page > 0)
    }

    fn discover(&mut self, listing: &ParsedListing) {
        match listing.page_count {
            Some(count) => self.page = Some(count),
            None => tracing::debug!("No page count on the front page, staying on it"),
        }
    }

    fn advance(&mut self) {
        self.page = self.page.map(|page| page.saturating_sub(1));
    }
}

impl fmt::Display for IndexPagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "page {}", page),
            None => write!(f, "front page"),
        }
    }
}

/// Calendar-day pagination of the abyss-best feed
///
/// Walks back one day at a time from the start date; days older than the
/// lookback window are never visited.
#[derive(Debug, Clone)]
pub struct DatePagination {
    date: NaiveDate,
    earliest: NaiveDate,
}

impl DatePagination {
    pub fn new(start: NaiveDate, lookback_months: u32) -> Self {
        let earliest = start
            .checked_sub_months(Months::new(lookback_months))
            .unwrap_or(start);
        Self {
            date: start,
            earliest,
        }
    }

    #[cfg(test)]
    fn date(&self) -> NaiveDate {
        self.date
    }

    #[cfg(test)]
    fn earliest(&self) -> NaiveDate {
        self.earliest
    }
}

impl Pagination for DatePagination {
    fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.date.format("%Y%m%d")
        )
    }

    fn has_more(&self) -> bool {
        self.date >= self.earliest
    }

    fn advance(&mut self) {
        match self.date.pred_opt() {
            Some(previous) => self.date = previous,
            None => self.earliest = NaiveDate::MAX,
        }
    }
}

impl fmt::Display for DatePagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

/// Result of a completed walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutcome {
    /// Cursor to store for the next run
    pub cursor: Cursor,

    /// Number of quotes written
    pub saved: usize,

    /// Number of pages fetched
    pub pages: usize,
}

/// Walks one feed from its newest page backward
pub struct FeedWalker<P> {
    name: &'static str,
    base_url: String,
    fetcher: PageFetcher,
    sink: RecordSink,
    ordering: IdOrdering,
    pagination: P,
}

impl<P: Pagination> FeedWalker<P> {
    pub fn new(
        name: &'static str,
        base_url: impl Into<String>,
        fetcher: PageFetcher,
        sink: RecordSink,
        ordering: IdOrdering,
        pagination: P,
    ) -> Self {
        Self {
            name,
            base_url: base_url.into(),
            fetcher,
            sink,
            ordering,
            pagination,
        }
    }

    /// Runs the walk against the cursor stored by the previous run
    ///
    /// The first page is always fetched. After that, pages are fetched while
    /// the newest quote of the last page was newer than `prior` and the
    /// pagination has pages left. The returned cursor is the greatest new id
    /// of the first page, or `prior` if that page had nothing new.
    ///
    /// # Returns
    ///
    /// * `Ok(FeedOutcome)` - Walk finished
    /// * `Err(ArchiverError)` - A fetch or a write failed; the walk stops there
    pub async fn walk(mut self, prior: Cursor) -> Result<FeedOutcome, ArchiverError> {
        let mut first_iteration = true;
        let mut max_seen_id = String::new();
        let mut cursor = prior.clone();
        let mut saved = 0;
        let mut pages = 0;

        while first_iteration
            || (prior.admits(&max_seen_id, self.ordering) && self.pagination.has_more())
        {
            let url = self.pagination.url(&self.base_url);
            tracing::debug!("[{}] Fetching {} ({})", self.name, url, self.pagination);

            let body = self.fetcher.fetch(&url).await?;
            let listing = parse_listing(&body);
            pages += 1;

            if let Some(newest) = listing.records.first() {
                max_seen_id = newest.id.clone();
            }

            let fresh: Vec<Record> = listing
                .records
                .iter()
                .filter(|record| prior.admits(&record.id, self.ordering))
                .cloned()
                .collect();

            if first_iteration {
                if let Some(newest) = self
                    .ordering
                    .max_id(fresh.iter().map(|record| record.id.as_str()))
                {
                    cursor = Cursor::new(newest);
                }
                self.pagination.discover(&listing);
                first_iteration = false;
            }

            self.pagination.advance();

            let found = listing.records.len();
            let written = self.sink.save_all(fresh).await?;
            saved += written;

            tracing::debug!(
                "[{}] {} quotes on page, {} new, newest id {:?}",
                self.name,
                found,
                written,
                max_seen_id
            );
        }

        tracing::info!(
            "[{}] Walked {} pages, saved {} quotes (cursor {} -> {})",
            self.name,
            pages,
            saved,
            prior,
            cursor
        );

        Ok(FeedOutcome {
            cursor,
            saved,
            pages,
        })
    }
}
