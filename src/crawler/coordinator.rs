//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs one archiving pass:
//! - Loading the cursors stored by the previous run
//! - Walking the main and abyss-best feeds concurrently
//! - Storing the new cursors, only when both walks succeeded

use crate::config::Config;
use crate::crawler::walker::{DatePagination, FeedOutcome, FeedWalker, IndexPagination};
use crate::crawler::PageFetcher;
use crate::output::CrawlSummary;
use crate::state::CrawlState;
use crate::storage::RecordSink;
use crate::{ArchiverError, Result};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Main archiver coordinator structure
pub struct Coordinator {
    config: Config,
    fetcher: PageFetcher,
    state_path: PathBuf,
    fresh: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The archiver configuration
    /// * `fresh` - Ignore stored cursors and start from the sentinels
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ArchiverError)` - Failed to build the HTTP client
    pub fn new(config: Config, fresh: bool) -> Result<Self> {
        let fetcher = PageFetcher::new(&config.http)?;
        let state_path = PathBuf::from(&config.state.path);

        Ok(Self {
            config,
            fetcher,
            state_path,
            fresh,
        })
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Runs one pass starting from today's date
    pub async fn run(&self) -> Result<CrawlSummary> {
        self.run_from(Local::now().date_naive()).await
    }

    /// Runs one pass with the abyss-best walk starting at `start`
    ///
    /// 1. Loads the stored state (missing or unreadable means first run)
    /// 2. Spawns both feed walkers and waits for both
    /// 3. If either failed, returns its error without touching the state file
    /// 4. Otherwise replaces the state file with the new cursors
    pub async fn run_from(&self, start: NaiveDate) -> Result<CrawlSummary> {
        let started = Instant::now();

        let prior = if self.fresh {
            tracing::info!("Fresh run requested, ignoring {}", self.state_path.display());
            CrawlState::default()
        } else {
            CrawlState::load_or_default(&self.state_path).await
        };

        tracing::info!(
            "Starting crawl (main cursor {}, abyss-best cursor {}, ordering {})",
            prior.main,
            prior.abyss_best,
            self.config.crawler.id_ordering
        );

        let crawler = &self.config.crawler;
        let feeds = &self.config.feeds;

        let main_walker = FeedWalker::new(
            "main",
            feeds.main.base_url.clone(),
            self.fetcher.clone(),
            RecordSink::new(&feeds.main.output_dir, crawler.write_concurrency),
            crawler.id_ordering,
            IndexPagination::new(),
        );
        let abyss_best_walker = FeedWalker::new(
            "abyss-best",
            feeds.abyss_best.base_url.clone(),
            self.fetcher.clone(),
            RecordSink::new(&feeds.abyss_best.output_dir, crawler.write_concurrency),
            crawler.id_ordering,
            DatePagination::new(start, crawler.lookback_months),
        );

        let main_task = tokio::spawn(main_walker.walk(prior.main.clone()));
        let abyss_best_task = tokio::spawn(abyss_best_walker.walk(prior.abyss_best.clone()));

        let (main, abyss_best) = tokio::join!(main_task, abyss_best_task);
        let (main, abyss_best) = settle(
            main.map_err(ArchiverError::from).and_then(|r| r),
            abyss_best.map_err(ArchiverError::from).and_then(|r| r),
        )?;

        let state = CrawlState {
            main: main.cursor,
            abyss_best: abyss_best.cursor,
        };
        state.save(&self.state_path).await?;
        tracing::debug!("Saved state to {}", self.state_path.display());

        Ok(CrawlSummary {
            main_saved: main.saved,
            abyss_best_saved: abyss_best.saved,
            pages_fetched: main.pages + abyss_best.pages,
            state,
            elapsed: started.elapsed(),
        })
    }
}

/// Combines both walk results; any failure discards the other walk's progress
fn settle(
    main: Result<FeedOutcome>,
    abyss_best: Result<FeedOutcome>,
) -> Result<(FeedOutcome, FeedOutcome)> {
    match (main, abyss_best) {
        (Ok(main), Ok(abyss_best)) => Ok((main, abyss_best)),
        (Err(e), Ok(abyss_best)) => {
            tracing::error!("[main] Walk failed: {}", e);
            tracing::warn!(
                "Discarding abyss-best cursor ({} quotes were saved)",
                abyss_best.saved
            );
            Err(e)
        }
        (Ok(main), Err(e)) => {
            tracing::error!("[abyss-best] Walk failed: {}", e);
            tracing::warn!("Discarding main cursor ({} quotes were saved)", main.saved);
            Err(e)
        }
        (Err(e), Err(other)) => {
            tracing::error!("[main] Walk failed: {}", e);
            tracing::error!("[abyss-best] Walk failed: {}", other);
            Err(e)
        }
    }
}
