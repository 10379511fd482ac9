//! File-per-quote persistence
//!
//! Every quote becomes `{id}@{timestamp}.txt` inside the feed's output
//! directory. Writes overwrite, so saving the same quote twice is harmless.

use crate::crawler::Record;
use crate::ArchiverError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Writes quotes of one feed into its output directory
///
/// Clones share the same concurrency limit.
#[derive(Debug, Clone)]
pub struct RecordSink {
    dir: PathBuf,
    limit: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl RecordSink {
    /// Creates a sink writing into `dir` with at most `max_concurrent` writes in flight
    ///
    /// The directory is expected to exist already.
    pub fn new(dir: impl Into<PathBuf>, max_concurrent: usize) -> Self {
        Self {
            dir: dir.into(),
            limit: Arc::new(Semaphore::new(max_concurrent.max(1))),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Full path of the file a quote is written to
    pub fn path_for(&self, record: &Record) -> PathBuf {
        self.dir.join(record_file_name(record))
    }

    /// Highest number of writes observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Writes a single quote
    pub async fn save(&self, record: &Record) -> Result<(), ArchiverError> {
        let _permit = self.limit.acquire().await;
        write_tracked(
            self.path_for(record),
            record.text.clone(),
            &self.in_flight,
            &self.peak,
        )
        .await
    }

    /// Writes every quote concurrently and waits for all of them
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of quotes written
    /// * `Err(ArchiverError::Persistence)` - The first write that failed;
    ///   writes still pending are aborted
    pub async fn save_all(&self, records: Vec<Record>) -> Result<usize, ArchiverError> {
        let mut writes = JoinSet::new();

        for record in records {
            let limit = Arc::clone(&self.limit);
            let in_flight = Arc::clone(&self.in_flight);
            let peak = Arc::clone(&self.peak);
            let path = self.path_for(&record);

            writes.spawn(async move {
                let _permit = limit.acquire_owned().await;
                write_tracked(path, record.text, &in_flight, &peak).await
            });
        }

        let mut saved = 0;
        while let Some(result) = writes.join_next().await {
            result??;
            saved += 1;
        }

        Ok(saved)
    }
}

async fn write_tracked(
    path: PathBuf,
    body: String,
    in_flight: &AtomicUsize,
    peak: &AtomicUsize,
) -> Result<(), ArchiverError> {
    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    peak.fetch_max(now, Ordering::SeqCst);

    let result = tokio::fs::write(&path, body).await;
    in_flight.fetch_sub(1, Ordering::SeqCst);

    match result {
        Ok(()) => {
            tracing::trace!("Saved {}", path.display());
            Ok(())
        }
        Err(source) => Err(ArchiverError::Persistence { path, source }),
    }
}

/// File name for a quote: `{id}@{timestamp}.txt`
///
/// Path separators are replaced so the file stays inside the output directory.
pub fn record_file_name(record: &Record) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "-");
    format!("{}@{}.txt", clean(&record.id), clean(&record.timestamp))
}
